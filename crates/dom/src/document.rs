//! Document - the entry point for tree lookups and URL resolution
//!
//! A `Document` owns the arena, knows which node is the `#document` root and
//! carries the document URL. It can be built empty (an `about:blank` page with
//! the `HTML > HEAD, BODY` skeleton) or from a CDP `DOM.getDocument` payload.

use serde_json::Value;
use url::Url;

use crate::arena::DomArena;
use crate::class_list::ClassList;
use crate::error::{DomError, Result};
use crate::selector::SelectorList;
use crate::types::{DomNode, NodeId, NodeType};
use crate::utils;

pub struct Document {
    arena: DomArena,
    root: NodeId,
    /// `None` is `about:blank`, which cannot serve as a base for relative URLs
    url: Option<Url>,
}

impl Document {
    /// Empty `about:blank` document with `<html><head></head><body></body></html>`
    pub fn new() -> Self {
        let (arena, root) = DomArena::document_skeleton();
        Self {
            arena,
            root,
            url: None,
        }
    }

    /// Empty document served from `url`
    pub fn with_url(url: &str) -> Result<Self> {
        let mut doc = Self::new();
        doc.set_url(url)?;
        Ok(doc)
    }

    /// Build a document from a CDP `DOM.getDocument` response
    ///
    /// ```json
    /// {
    ///   "root": {
    ///     "nodeId": 1,
    ///     "nodeType": 9,
    ///     "nodeName": "#document",
    ///     "documentURL": "https://example.com/",
    ///     "children": [...]
    ///   }
    /// }
    /// ```
    pub fn from_cdp(cdp_response: &Value) -> Result<Self> {
        let root = cdp_response
            .get("root")
            .ok_or_else(|| DomError::CdpError("Missing 'root' in CDP response".to_string()))?;

        let mut arena = DomArena::new();
        let root_id = parse_cdp_node(&mut arena, root)?;

        let root_type = arena.get(root_id)?.node_type;
        if root_type != NodeType::Document {
            return Err(DomError::InvalidNodeType {
                expected: "Document".to_string(),
                actual: format!("{:?}", root_type),
            });
        }

        let mut doc = Self {
            arena,
            root: root_id,
            url: None,
        };
        if let Some(url) = root["documentURL"].as_str() {
            doc.set_url(url)?;
        }

        tracing::debug!(nodes = doc.arena.len(), url = doc.url(), "loaded document from CDP");
        Ok(doc)
    }

    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut DomArena {
        &mut self.arena
    }

    /// The `#document` node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The document URL as a string
    pub fn url(&self) -> &str {
        self.url.as_ref().map_or("about:blank", |u| u.as_str())
    }

    pub fn set_url(&mut self, url: &str) -> Result<()> {
        let parsed = Url::parse(url)?;
        self.url = (parsed.as_str() != "about:blank").then_some(parsed);
        Ok(())
    }

    /// The `<html>` element
    pub fn document_element(&self) -> Result<Option<NodeId>> {
        self.child_element(self.root, "html")
    }

    pub fn head(&self) -> Result<Option<NodeId>> {
        match self.document_element()? {
            Some(html) => self.child_element(html, "head"),
            None => Ok(None),
        }
    }

    pub fn body(&self) -> Result<Option<NodeId>> {
        match self.document_element()? {
            Some(html) => self.child_element(html, "body"),
            None => Ok(None),
        }
    }

    fn child_element(&self, parent: NodeId, tag: &str) -> Result<Option<NodeId>> {
        for &child in self.arena.children(parent)? {
            if self.arena.get(child)?.has_tag(tag) {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.arena.create_element(tag)
    }

    pub fn create_text_node(&mut self, data: &str) -> NodeId {
        self.arena.create_text_node(data)
    }

    /// First element in tree order matching `selector`. Only nodes attached
    /// to this document are considered.
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let arena = &self.arena;
        arena.find_descendant(self.root, |node| list.matches(arena, node.node_id))
    }

    /// Every attached element matching `selector`, in tree order
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let mut found = Vec::new();
        self.arena.traverse_df(self.root, |node| {
            if list.matches(&self.arena, node.node_id)? {
                found.push(node.node_id);
            }
            Ok(())
        })?;
        Ok(found)
    }

    pub fn get_element_by_id(&self, id: &str) -> Result<Option<NodeId>> {
        self.arena
            .find_descendant(self.root, |node| Ok(node.is_element() && node.id() == Some(id)))
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Result<Option<&str>> {
        Ok(self.arena.get(node)?.attr(name))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(node)?.set_attr(name, value);
        Ok(())
    }

    /// Class token view of an element
    pub fn class_list(&mut self, node: NodeId) -> Result<ClassList<'_>> {
        Ok(ClassList::new(self.element_mut(node)?))
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut DomNode> {
        let node = self.arena.get_mut(node)?;
        if !node.is_element() {
            return Err(DomError::InvalidNodeType {
                expected: "Element".to_string(),
                actual: format!("{:?}", node.node_type),
            });
        }
        Ok(node)
    }

    pub fn text_content(&self, node: NodeId) -> Result<String> {
        utils::text_content(&self.arena, node)
    }

    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()> {
        utils::set_text_content(&mut self.arena, node, text)
    }

    /// The document base URL: the first attached `<base href>` resolved
    /// against the document URL, otherwise the document URL itself
    pub fn base_url(&self) -> Result<Option<Url>> {
        let base = self.arena.find_descendant(self.root, |node| {
            Ok(node.has_tag("base") && node.attr("href").is_some())
        })?;

        if let Some(base) = base {
            if let Some(href) = self.arena.get(base)?.attr("href") {
                match self.parse_against_document(href) {
                    Ok(url) => return Ok(Some(url)),
                    Err(e) => {
                        tracing::debug!(href, error = %e, "ignoring unparseable <base href>");
                    }
                }
            }
        }

        Ok(self.url.clone())
    }

    fn parse_against_document(&self, input: &str) -> std::result::Result<Url, url::ParseError> {
        match &self.url {
            Some(url) => url.join(input),
            None => Url::parse(input),
        }
    }

    /// Resolve `input` against the base URL
    pub fn resolve_url(&self, input: &str) -> Result<Url> {
        let resolved = match self.base_url()? {
            Some(base) => base.join(input)?,
            None => Url::parse(input)?,
        };
        Ok(resolved)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively parse a CDP node and its children into the arena
fn parse_cdp_node(arena: &mut DomArena, cdp_node: &Value) -> Result<NodeId> {
    let node_type_val = cdp_node["nodeType"]
        .as_u64()
        .ok_or_else(|| DomError::CdpError("Missing nodeType".to_string()))?;

    let node_type = u8::try_from(node_type_val)
        .ok()
        .and_then(NodeType::from_u8)
        .ok_or_else(|| DomError::InvalidNodeType {
            expected: "valid NodeType".to_string(),
            actual: node_type_val.to_string(),
        })?;

    let node_name = cdp_node["nodeName"]
        .as_str()
        .ok_or_else(|| DomError::CdpError("Missing nodeName".to_string()))?;

    let node_id = match node_type {
        NodeType::Element => arena.create_element(node_name),
        _ => arena.create_node(node_type, node_name),
    };

    let node = arena.get_mut(node_id)?;
    node.node_value = cdp_node["nodeValue"].as_str().unwrap_or("").to_string();

    // Attributes arrive as a flat [name, value, name, value, ...] array
    if let Some(attrs) = cdp_node["attributes"].as_array() {
        for pair in attrs.chunks_exact(2) {
            if let (Some(name), Some(value)) = (pair[0].as_str(), pair[1].as_str()) {
                node.set_attr(name, value);
            }
        }
    }

    if let Some(children) = cdp_node["children"].as_array() {
        for child in children {
            let child_id = parse_cdp_node(arena, child)?;
            arena.append_child(node_id, child_id)?;
        }
    }

    Ok(node_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_skeleton() {
        let doc = Document::new();
        let html = doc.document_element().unwrap().unwrap();
        let head = doc.head().unwrap().unwrap();
        let body = doc.body().unwrap().unwrap();

        assert_eq!(doc.url(), "about:blank");
        assert_eq!(doc.arena().parent(html).unwrap(), Some(doc.root()));
        assert_eq!(doc.arena().children(html).unwrap(), &[head, body]);
    }

    #[test]
    fn test_query_selector_ignores_detached_nodes() {
        let mut doc = Document::new();
        let body = doc.body().unwrap().unwrap();
        let attached = doc.create_element("div");
        doc.set_attribute(attached, "id", "test").unwrap();
        doc.arena_mut().append_child(body, attached).unwrap();

        let detached = doc.create_element("div");
        doc.set_attribute(detached, "id", "loose").unwrap();

        assert_eq!(doc.query_selector("#test").unwrap(), Some(attached));
        assert_eq!(doc.query_selector("#loose").unwrap(), None);
        assert_eq!(doc.query_selector_all("div").unwrap(), vec![attached]);
        assert_eq!(doc.get_element_by_id("test").unwrap(), Some(attached));
    }

    #[test]
    fn test_query_selector_invalid() {
        let doc = Document::new();
        assert!(matches!(
            doc.query_selector("##"),
            Err(DomError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_class_list_requires_element() {
        let mut doc = Document::new();
        let text = doc.create_text_node("x");
        assert!(matches!(
            doc.class_list(text),
            Err(DomError::InvalidNodeType { .. })
        ));
    }

    #[test]
    fn test_base_url_prefers_base_element() {
        let mut doc = Document::with_url("https://example.com/a/b.html").unwrap();
        assert_eq!(
            doc.resolve_url("c.html").unwrap().as_str(),
            "https://example.com/a/c.html"
        );

        let head = doc.head().unwrap().unwrap();
        let base = doc.create_element("base");
        doc.set_attribute(base, "href", "/root/").unwrap();
        doc.arena_mut().append_child(head, base).unwrap();

        assert_eq!(
            doc.base_url().unwrap().unwrap().as_str(),
            "https://example.com/root/"
        );
        assert_eq!(
            doc.resolve_url("news").unwrap().as_str(),
            "https://example.com/root/news"
        );
    }

    #[test]
    fn test_about_blank_cannot_resolve_relative() {
        let doc = Document::new();
        assert_eq!(doc.base_url().unwrap(), None);
        assert!(matches!(
            doc.resolve_url("/news"),
            Err(DomError::InvalidUrl(_))
        ));
        assert_eq!(
            doc.resolve_url("https://example.com").unwrap().as_str(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_from_cdp() {
        let cdp_json = serde_json::json!({
            "root": {
                "nodeId": 1,
                "backendNodeId": 1,
                "nodeType": 9,
                "nodeName": "#document",
                "documentURL": "https://example.com/page",
                "children": [{
                    "nodeId": 2,
                    "nodeType": 1,
                    "nodeName": "HTML",
                    "attributes": [],
                    "children": [
                        { "nodeId": 3, "nodeType": 1, "nodeName": "HEAD" },
                        {
                            "nodeId": 4,
                            "nodeType": 1,
                            "nodeName": "BODY",
                            "children": [{
                                "nodeId": 5,
                                "nodeType": 1,
                                "nodeName": "DIV",
                                "attributes": ["id", "test", "class", "a b"],
                                "children": [{
                                    "nodeId": 6,
                                    "nodeType": 3,
                                    "nodeName": "#text",
                                    "nodeValue": "example"
                                }]
                            }]
                        }
                    ]
                }]
            }
        });

        let doc = Document::from_cdp(&cdp_json).unwrap();
        assert_eq!(doc.url(), "https://example.com/page");
        assert_eq!(doc.arena().len(), 6);

        let div = doc.query_selector("div.b").unwrap().unwrap();
        assert_eq!(doc.get_attribute(div, "id").unwrap(), Some("test"));
        assert_eq!(doc.text_content(div).unwrap(), "example");
        assert!(doc.head().unwrap().is_some());
    }

    #[test]
    fn test_from_cdp_rejects_non_document_root() {
        let cdp_json = serde_json::json!({
            "root": { "nodeId": 1, "nodeType": 1, "nodeName": "DIV" }
        });
        assert!(matches!(
            Document::from_cdp(&cdp_json),
            Err(DomError::InvalidNodeType { .. })
        ));
        assert!(matches!(
            Document::from_cdp(&serde_json::json!({})),
            Err(DomError::CdpError(_))
        ));
    }
}
