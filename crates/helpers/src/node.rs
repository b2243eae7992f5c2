//! DOM helpers: selection, insertion, removal, classes and URLs
//!
//! Thin wrappers over `dom::Document`. Failures from the document (missing
//! parent, bad selector, malformed class token) propagate unchanged.

use dom::{Document, DomError, NodeId};

use crate::error::Result;

/// First attached element matching `selector`, if any
pub fn select(doc: &Document, selector: &str) -> Result<Option<NodeId>> {
    Ok(doc.query_selector(selector)?)
}

/// Detach `node` from its parent and return it
pub fn remove_node(doc: &mut Document, node: NodeId) -> Result<NodeId> {
    let arena = doc.arena_mut();
    let parent = arena.parent(node)?.ok_or(DomError::NoParent(node))?;
    Ok(arena.remove_child(parent, node)?)
}

/// Place `node` directly after `target` under `target`'s parent
pub fn insert_after(doc: &mut Document, node: NodeId, target: NodeId) -> Result<()> {
    let arena = doc.arena_mut();
    let parent = arena.parent(target)?.ok_or(DomError::NoParent(target))?;

    if arena.last_child(parent)? == Some(target) {
        arena.append_child(parent, node)?;
    } else {
        let next = arena.next_sibling(target)?;
        arena.insert_before(parent, node, next)?;
    }

    tracing::trace!(node, target, parent, "inserted after");
    Ok(())
}

/// One class token or several
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassNames<'a> {
    One(&'a str),
    Many(Vec<&'a str>),
}

impl<'a> ClassNames<'a> {
    pub fn iter(&self) -> impl Iterator<Item = &'a str> + '_ {
        let (one, many) = match self {
            ClassNames::One(name) => (Some(*name), &[][..]),
            ClassNames::Many(names) => (None, names.as_slice()),
        };
        one.into_iter().chain(many.iter().copied())
    }
}

impl<'a> From<&'a str> for ClassNames<'a> {
    fn from(name: &'a str) -> Self {
        ClassNames::One(name)
    }
}

impl<'a> From<&'a String> for ClassNames<'a> {
    fn from(name: &'a String) -> Self {
        ClassNames::One(name.as_str())
    }
}

impl<'a> From<&[&'a str]> for ClassNames<'a> {
    fn from(names: &[&'a str]) -> Self {
        ClassNames::Many(names.to_vec())
    }
}

impl<'a, const N: usize> From<[&'a str; N]> for ClassNames<'a> {
    fn from(names: [&'a str; N]) -> Self {
        ClassNames::Many(names.to_vec())
    }
}

impl<'a> From<Vec<&'a str>> for ClassNames<'a> {
    fn from(names: Vec<&'a str>) -> Self {
        ClassNames::Many(names)
    }
}

impl<'a> From<&'a [String]> for ClassNames<'a> {
    fn from(names: &'a [String]) -> Self {
        ClassNames::Many(names.iter().map(String::as_str).collect())
    }
}

impl<'a> From<&'a Vec<String>> for ClassNames<'a> {
    fn from(names: &'a Vec<String>) -> Self {
        names.as_slice().into()
    }
}

/// Add class tokens to an element one at a time; tokens already present
/// stay as they are.
///
/// An invalid token stops the loop: tokens before it are already applied.
pub fn add_class<'a>(
    doc: &mut Document,
    node: NodeId,
    classes: impl Into<ClassNames<'a>>,
) -> Result<()> {
    let classes: ClassNames = classes.into();
    for name in classes.iter() {
        doc.class_list(node)?.add([name])?;
    }
    Ok(())
}

/// Remove class tokens from an element one at a time; absent tokens are
/// ignored. Stops at the first invalid token like [`add_class`].
pub fn remove_class<'a>(
    doc: &mut Document,
    node: NodeId,
    classes: impl Into<ClassNames<'a>>,
) -> Result<()> {
    let classes: ClassNames = classes.into();
    for name in classes.iter() {
        doc.class_list(node)?.remove([name])?;
    }
    Ok(())
}

/// Resolve `url` against the document base URL, honouring `<base href>`.
///
/// Input that cannot be resolved comes back unchanged, as an anchor's
/// `href` would report it.
pub fn get_absolute_url(doc: &Document, url: &str) -> String {
    match doc.resolve_url(url) {
        Ok(resolved) => resolved.into(),
        Err(e) => {
            tracing::debug!(url, error = %e, "could not resolve URL, returning it as-is");
            url.to_string()
        }
    }
}
