//! CSS selector parsing and matching
//!
//! Covers the subset of Selectors Level 3 that page scripts lean on for
//! single-element lookups:
//!
//! ```text
//! list      := complex ( ',' complex )*
//! complex   := compound ( combinator compound )*
//! combinator:= ' ' | '>' | '+' | '~'
//! compound  := ( tag | '*' )? ( '#id' | '.class' | '[attr op value]' | ':pseudo' )*
//! ```
//!
//! Matching runs right to left: the rightmost compound is tested against the
//! candidate, then combinators walk towards ancestors or earlier siblings.

use std::str::FromStr;

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOperator {
    /// `[a=v]`
    Equals,
    /// `[a~=v]`
    Includes,
    /// `[a|=v]`
    DashMatch,
    /// `[a^=v]`
    Prefix,
    /// `[a$=v]`
    Suffix,
    /// `[a*=v]`
    Substring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    FirstChild,
    LastChild,
    OnlyChild,
    Root,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Id(String),
    Class(String),
    Attribute {
        name: String,
        matcher: Option<(AttrOperator, String)>,
    },
    Pseudo(PseudoClass),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    /// `None` is the universal selector
    tag: Option<String>,
    simples: Vec<SimpleSelector>,
}

/// Compounds joined by combinators; `combinators[i]` sits between
/// `compounds[i]` and `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    compounds: Vec<CompoundSelector>,
    combinators: Vec<Combinator>,
}

/// A parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse_list()
    }

    /// Whether the node matches any selector in the list
    pub fn matches(&self, arena: &DomArena, node_id: NodeId) -> Result<bool> {
        for selector in &self.selectors {
            let Some(last) = selector.compounds.len().checked_sub(1) else {
                continue;
            };
            if matches_complex(selector, arena, node_id, last)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl FromStr for SelectorList {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn matches_complex(
    selector: &ComplexSelector,
    arena: &DomArena,
    node_id: NodeId,
    index: usize,
) -> Result<bool> {
    let node = arena.get(node_id)?;
    if !matches_compound(&selector.compounds[index], arena, node)? {
        return Ok(false);
    }
    if index == 0 {
        return Ok(true);
    }

    match selector.combinators[index - 1] {
        Combinator::Child => match parent_element(arena, node_id)? {
            Some(parent) => matches_complex(selector, arena, parent, index - 1),
            None => Ok(false),
        },
        Combinator::Descendant => {
            let mut current = parent_element(arena, node_id)?;
            while let Some(ancestor) = current {
                if matches_complex(selector, arena, ancestor, index - 1)? {
                    return Ok(true);
                }
                current = parent_element(arena, ancestor)?;
            }
            Ok(false)
        }
        Combinator::NextSibling => match preceding_elements(arena, node_id)?.last() {
            Some(&sibling) => matches_complex(selector, arena, sibling, index - 1),
            None => Ok(false),
        },
        Combinator::SubsequentSibling => {
            for sibling in preceding_elements(arena, node_id)?.into_iter().rev() {
                if matches_complex(selector, arena, sibling, index - 1)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

fn matches_compound(compound: &CompoundSelector, arena: &DomArena, node: &DomNode) -> Result<bool> {
    if !node.is_element() {
        return Ok(false);
    }
    if let Some(tag) = &compound.tag {
        if !node.has_tag(tag) {
            return Ok(false);
        }
    }

    for simple in &compound.simples {
        let ok = match simple {
            SimpleSelector::Id(id) => node.id() == Some(id.as_str()),
            SimpleSelector::Class(class) => node
                .attr("class")
                .map(|v| v.split_ascii_whitespace().any(|t| t == class.as_str()))
                .unwrap_or(false),
            SimpleSelector::Attribute { name, matcher } => {
                let value = node
                    .attributes
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v.as_str());
                match (value, matcher) {
                    (None, _) => false,
                    (Some(_), None) => true,
                    (Some(actual), Some((op, expected))) => attr_matches(*op, actual, expected),
                }
            }
            SimpleSelector::Pseudo(pseudo) => matches_pseudo(*pseudo, arena, node)?,
        };
        if !ok {
            return Ok(false);
        }
    }

    Ok(true)
}

fn attr_matches(op: AttrOperator, actual: &str, expected: &str) -> bool {
    match op {
        AttrOperator::Equals => actual == expected,
        AttrOperator::Includes => {
            !expected.is_empty()
                && !expected.contains(char::is_whitespace)
                && actual.split_ascii_whitespace().any(|t| t == expected)
        }
        AttrOperator::DashMatch => {
            actual == expected
                || (actual.starts_with(expected) && actual[expected.len()..].starts_with('-'))
        }
        AttrOperator::Prefix => !expected.is_empty() && actual.starts_with(expected),
        AttrOperator::Suffix => !expected.is_empty() && actual.ends_with(expected),
        AttrOperator::Substring => !expected.is_empty() && actual.contains(expected),
    }
}

fn matches_pseudo(pseudo: PseudoClass, arena: &DomArena, node: &DomNode) -> Result<bool> {
    if pseudo == PseudoClass::Empty {
        for &child in &node.children_ids {
            let child = arena.get(child)?;
            let counts = match child.node_type {
                NodeType::Text | NodeType::CdataSection => !child.node_value.is_empty(),
                NodeType::Comment | NodeType::ProcessingInstruction => false,
                _ => true,
            };
            if counts {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    let Some(parent_id) = node.parent_id else {
        return Ok(false);
    };
    let siblings = element_children(arena, parent_id)?;

    Ok(match pseudo {
        PseudoClass::FirstChild => siblings.first() == Some(&node.node_id),
        PseudoClass::LastChild => siblings.last() == Some(&node.node_id),
        PseudoClass::OnlyChild => siblings.len() == 1,
        PseudoClass::Root => arena.get(parent_id)?.node_type == NodeType::Document,
        PseudoClass::Empty => true,
    })
}

fn parent_element(arena: &DomArena, node_id: NodeId) -> Result<Option<NodeId>> {
    match arena.parent(node_id)? {
        Some(parent) if arena.get(parent)?.is_element() => Ok(Some(parent)),
        _ => Ok(None),
    }
}

fn element_children(arena: &DomArena, parent_id: NodeId) -> Result<Vec<NodeId>> {
    let mut elements = Vec::new();
    for &child in arena.children(parent_id)? {
        if arena.get(child)?.is_element() {
            elements.push(child);
        }
    }
    Ok(elements)
}

/// Element siblings before the node, in document order
fn preceding_elements(arena: &DomArena, node_id: NodeId) -> Result<Vec<NodeId>> {
    let Some(parent_id) = arena.parent(node_id)? else {
        return Ok(Vec::new());
    };
    let mut elements = element_children(arena, parent_id)?;
    let pos = elements.iter().position(|&id| id == node_id).unwrap_or(0);
    elements.truncate(pos);
    Ok(elements)
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> DomError {
        DomError::InvalidSelector {
            selector: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Returns whether any whitespace was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(&mut self) -> Result<SelectorList> {
        let mut selectors = Vec::new();
        loop {
            self.skip_whitespace();
            selectors.push(self.parse_complex()?);
            if !self.eat(',') {
                break;
            }
        }
        if self.pos < self.chars.len() {
            return Err(self.error(format!("unexpected '{}'", self.chars[self.pos])));
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                Some(_) if had_whitespace => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{c}'"))),
            };
            if combinator != Combinator::Descendant {
                self.pos += 1;
                self.skip_whitespace();
            }
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }

        Ok(ComplexSelector {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<CompoundSelector> {
        let mut compound = CompoundSelector::default();
        let mut empty = true;

        if self.eat('*') {
            empty = false;
        } else if self.peek().is_some_and(is_ident_start) {
            compound.tag = Some(self.parse_ident()?);
            empty = false;
        }

        loop {
            let simple = match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    SimpleSelector::Id(self.parse_ident()?)
                }
                Some('.') => {
                    self.pos += 1;
                    SimpleSelector::Class(self.parse_ident()?)
                }
                Some('[') => {
                    self.pos += 1;
                    self.parse_attribute()?
                }
                Some(':') => {
                    self.pos += 1;
                    self.parse_pseudo()?
                }
                _ => break,
            };
            compound.simples.push(simple);
            empty = false;
        }

        if empty {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected a selector, found '{c}'")),
                None => self.error("expected a selector"),
            });
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String> {
        let mut ident = String::new();

        if self.peek() == Some('-') {
            ident.push('-');
            self.pos += 1;
        }
        match self.peek() {
            Some(c) if is_ident_start(c) && !c.is_ascii_digit() => {}
            Some('\\') => {}
            Some('-') if ident == "-" => {}
            _ => return Err(self.error("expected an identifier")),
        }

        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                match self.bump() {
                    Some(escaped) => ident.push(escaped),
                    None => return Err(self.error("dangling escape")),
                }
            } else if is_ident_char(c) {
                ident.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(ident)
    }

    fn parse_attribute(&mut self) -> Result<SimpleSelector> {
        self.skip_whitespace();
        let name = self.parse_ident()?;
        self.skip_whitespace();

        if self.eat(']') {
            return Ok(SimpleSelector::Attribute {
                name,
                matcher: None,
            });
        }

        let op = match self.bump() {
            Some('=') => AttrOperator::Equals,
            Some(c) => {
                let op = match c {
                    '~' => AttrOperator::Includes,
                    '|' => AttrOperator::DashMatch,
                    '^' => AttrOperator::Prefix,
                    '$' => AttrOperator::Suffix,
                    '*' => AttrOperator::Substring,
                    _ => return Err(self.error("invalid attribute operator")),
                };
                if !self.eat('=') {
                    return Err(self.error("invalid attribute operator"));
                }
                op
            }
            None => return Err(self.error("unterminated attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                self.parse_quoted(quote)?
            }
            _ => self.parse_ident()?,
        };
        self.skip_whitespace();

        if !self.eat(']') {
            return Err(self.error("unterminated attribute selector"));
        }
        Ok(SimpleSelector::Attribute {
            name,
            matcher: Some((op, value)),
        })
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(self.error("dangling escape")),
                },
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn parse_pseudo(&mut self) -> Result<SimpleSelector> {
        if self.peek() == Some(':') {
            return Err(self.error("pseudo-elements never match elements"));
        }
        let name = self.parse_ident()?.to_ascii_lowercase();
        let pseudo = match name.as_str() {
            "first-child" => PseudoClass::FirstChild,
            "last-child" => PseudoClass::LastChild,
            "only-child" => PseudoClass::OnlyChild,
            "root" => PseudoClass::Root,
            "empty" => PseudoClass::Empty,
            other => return Err(self.error(format!("unsupported pseudo-class ':{other}'"))),
        };
        Ok(SimpleSelector::Pseudo(pseudo))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || c == '\\' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}
