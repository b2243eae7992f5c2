//! Class token set backed by an element's `class` attribute
//!
//! Mirrors `DOMTokenList`: tokens are split on ASCII whitespace, duplicates
//! collapse, and every mutation writes the set back joined by single spaces.

use crate::error::{DomError, Result};
use crate::types::DomNode;

/// Split a `class` attribute value into its ordered, de-duplicated tokens
pub fn parse_tokens(value: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = Vec::new();
    for token in value.split_ascii_whitespace() {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

/// Reject tokens a browser would throw on
pub fn validate_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(DomError::EmptyToken);
    }
    if token.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(DomError::InvalidTokenCharacter(token.to_string()));
    }
    Ok(())
}

/// Mutable view over one element's classes
pub struct ClassList<'a> {
    node: &'a mut DomNode,
}

impl<'a> ClassList<'a> {
    pub fn new(node: &'a mut DomNode) -> Self {
        Self { node }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.node
            .attr("class")
            .map(|value| value.split_ascii_whitespace().any(|t| t == token))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.node.attr("class").map(parse_tokens).map_or(0, |t| t.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tokens(&self) -> Vec<String> {
        self.node
            .attr("class")
            .map(parse_tokens)
            .unwrap_or_default()
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Add every token; tokens already present are left where they are.
    /// Nothing is written if any token is invalid.
    pub fn add<'t, I>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = &'t str>,
    {
        let tokens: Vec<&str> = tokens.into_iter().collect();
        for token in &tokens {
            validate_token(token)?;
        }

        let mut set = self.tokens();
        for token in tokens {
            if !set.iter().any(|t| t == token) {
                set.push(token.to_string());
            }
        }
        self.write(set);
        Ok(())
    }

    /// Remove every token; absent tokens are ignored.
    /// Nothing is written if any token is invalid.
    pub fn remove<'t, I>(&mut self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = &'t str>,
    {
        let tokens: Vec<&str> = tokens.into_iter().collect();
        for token in &tokens {
            validate_token(token)?;
        }

        let mut set = self.tokens();
        set.retain(|t| !tokens.contains(&t.as_str()));
        self.write(set);
        Ok(())
    }

    /// Flip a token, returning whether it is present afterwards
    pub fn toggle(&mut self, token: &str) -> Result<bool> {
        if self.contains(token) {
            self.remove([token])?;
            Ok(false)
        } else {
            self.add([token])?;
            Ok(true)
        }
    }

    fn write(&mut self, set: Vec<String>) {
        // An element that never had a class attribute keeps none after a
        // removal, matching the DOMTokenList update steps
        if set.is_empty() && self.node.attr("class").is_none() {
            return;
        }
        self.node.set_attr("class", set.join(" "));
    }
}
