//! Arena-based DOM tree storage
//!
//! Nodes live in a single `Vec` and refer to each other by `NodeId`.
//! Detaching a node only unlinks it; the slot stays valid so handles held by
//! callers keep working after removal, just like a removed browser node.
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

/// Arena allocator for DOM nodes
#[derive(Debug)]
pub struct DomArena {
    nodes: Vec<DomNode>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(64),
        }
    }

    /// Arena holding `#document > HTML > (HEAD, BODY)`, rooted at the
    /// returned `#document` node
    pub fn document_skeleton() -> (Self, NodeId) {
        let mut arena = Self::new();
        let root = arena.create_node(NodeType::Document, "#document");
        let html = arena.create_element("html");
        let head = arena.create_element("head");
        let body = arena.create_element("body");

        arena.link_fresh(root, html);
        arena.link_fresh(html, head);
        arena.link_fresh(html, body);
        (arena, root)
    }

    /// Link two nodes just returned by `create_*`; neither has a parent yet
    fn link_fresh(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child as usize].parent_id = Some(parent);
        self.nodes[parent as usize].children_ids.push(child);
    }

    /// Allocate a detached node, returns its ID
    pub fn create_node(&mut self, node_type: NodeType, node_name: impl Into<String>) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(DomNode::new(node_id, node_type, node_name));
        node_id
    }

    /// Allocate a detached element. Tag names are stored upper case.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create_node(NodeType::Element, tag.to_ascii_uppercase())
    }

    pub fn create_text_node(&mut self, data: impl Into<String>) -> NodeId {
        let id = self.create_node(NodeType::Text, "#text");
        self.nodes[id as usize].node_value = data.into();
        id
    }

    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        let id = self.create_node(NodeType::Comment, "#comment");
        self.nodes[id as usize].node_value = data.into();
        id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Total number of nodes, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, node_id: NodeId) -> Result<&[NodeId]> {
        Ok(self.get(node_id)?.children_ids.as_slice())
    }

    pub fn parent(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.parent_id)
    }

    pub fn first_child(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.children_ids.first().copied())
    }

    pub fn last_child(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.children_ids.last().copied())
    }

    pub fn next_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        self.sibling_at(node_id, |pos, len| (pos + 1 < len).then(|| pos + 1))
    }

    pub fn previous_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        self.sibling_at(node_id, |pos, _| pos.checked_sub(1))
    }

    fn sibling_at<F>(&self, node_id: NodeId, pick: F) -> Result<Option<NodeId>>
    where
        F: Fn(usize, usize) -> Option<usize>,
    {
        let Some(parent_id) = self.parent(node_id)? else {
            return Ok(None);
        };
        let siblings = self.children(parent_id)?;
        let pos = self.index_in(siblings, parent_id, node_id)?;
        Ok(pick(pos, siblings.len()).map(|i| siblings[i]))
    }

    fn index_in(&self, siblings: &[NodeId], parent: NodeId, child: NodeId) -> Result<usize> {
        siblings
            .iter()
            .position(|&id| id == child)
            .ok_or(DomError::NotAChild { parent, child })
    }

    /// True when `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> Result<bool> {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.parent(id)?;
        }
        Ok(false)
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.insert_before(parent, child, None)
    }

    /// Insert `node` into `parent` before `reference`, or at the end when
    /// `reference` is `None`.
    ///
    /// A node that already has a parent is moved, not copied.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId> {
        let parent_node = self.get(parent)?;
        let inserted = self.get(node)?;

        if !parent_node.node_type.can_have_children()
            || inserted.node_type == NodeType::Document
            || self.is_inclusive_ancestor(node, parent)?
        {
            return Err(DomError::HierarchyRequest {
                parent,
                child: node,
            });
        }

        if let Some(reference) = reference {
            if self.parent(reference)? != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }

        // Inserting a node before itself means inserting before its successor
        let reference = match reference {
            Some(r) if r == node => self.next_sibling(node)?,
            other => other,
        };

        self.detach(node)?;

        let children = &self.get(parent)?.children_ids;
        let index = match reference {
            Some(r) => self.index_in(children, parent, r)?,
            None => children.len(),
        };

        self.get_mut(parent)?.children_ids.insert(index, node);
        self.get_mut(node)?.parent_id = Some(parent);

        tracing::trace!(parent, node, index, "inserted node");
        Ok(node)
    }

    /// Remove `child` from `parent`'s child list
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId> {
        self.get(parent)?;
        if self.parent(child)? != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child)?;
        tracing::trace!(parent, child, "removed node");
        Ok(child)
    }

    /// Unlink a node from its current parent, if it has one
    fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let old_parent = self.get_mut(node_id)?.parent_id.take();
        if let Some(old_parent) = old_parent {
            let siblings = &mut self.get_mut(old_parent)?.children_ids;
            siblings.retain(|id| *id != node_id);
        }
        Ok(())
    }

    /// Traverse tree depth-first (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// First descendant of `start` (excluding `start`) in tree order that
    /// satisfies the predicate
    pub fn find_descendant<F>(&self, start_id: NodeId, mut predicate: F) -> Result<Option<NodeId>>
    where
        F: FnMut(&DomNode) -> Result<bool>,
    {
        let mut stack: Vec<NodeId> = self.children(start_id)?.iter().rev().copied().collect();

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            if predicate(node)? {
                return Ok(Some(node_id));
            }
            stack.extend(node.children_ids.iter().rev());
        }

        Ok(None)
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent_with_children(arena: &mut DomArena, count: usize) -> (NodeId, Vec<NodeId>) {
        let parent = arena.create_element("div");
        let children = (0..count)
            .map(|_| {
                let child = arena.create_element("span");
                arena.append_child(parent, child).unwrap();
                child
            })
            .collect();
        (parent, children)
    }

    #[test]
    fn test_create_element_uppercases_tag() {
        let mut arena = DomArena::new();
        let id = arena.create_element("div");
        let node = arena.get(id).unwrap();
        assert_eq!(node.node_name, "DIV");
        assert!(node.has_tag("div"));
        assert_eq!(node.parent_id, None);
    }

    #[test]
    fn test_append_and_siblings() {
        let mut arena = DomArena::new();
        let (parent, c) = parent_with_children(&mut arena, 3);

        assert_eq!(arena.children(parent).unwrap(), &c[..]);
        assert_eq!(arena.first_child(parent).unwrap(), Some(c[0]));
        assert_eq!(arena.last_child(parent).unwrap(), Some(c[2]));
        assert_eq!(arena.next_sibling(c[0]).unwrap(), Some(c[1]));
        assert_eq!(arena.next_sibling(c[2]).unwrap(), None);
        assert_eq!(arena.previous_sibling(c[1]).unwrap(), Some(c[0]));
        assert_eq!(arena.previous_sibling(c[0]).unwrap(), None);
        assert_eq!(arena.next_sibling(parent).unwrap(), None);
    }

    #[test]
    fn test_insert_before_reference() {
        let mut arena = DomArena::new();
        let (parent, c) = parent_with_children(&mut arena, 2);
        let middle = arena.create_element("p");

        arena.insert_before(parent, middle, Some(c[1])).unwrap();
        assert_eq!(arena.children(parent).unwrap(), &[c[0], middle, c[1]]);
        assert_eq!(arena.parent(middle).unwrap(), Some(parent));
    }

    #[test]
    fn test_insert_moves_attached_node() {
        let mut arena = DomArena::new();
        let (first, a) = parent_with_children(&mut arena, 2);
        let (second, _) = parent_with_children(&mut arena, 0);

        arena.append_child(second, a[0]).unwrap();
        assert_eq!(arena.children(first).unwrap(), &[a[1]]);
        assert_eq!(arena.children(second).unwrap(), &[a[0]]);
        assert_eq!(arena.parent(a[0]).unwrap(), Some(second));
    }

    #[test]
    fn test_insert_before_self_is_noop_move() {
        let mut arena = DomArena::new();
        let (parent, c) = parent_with_children(&mut arena, 3);

        arena.insert_before(parent, c[1], Some(c[1])).unwrap();
        assert_eq!(arena.children(parent).unwrap(), &c[..]);
    }

    #[test]
    fn test_insert_rejects_cycles() {
        let mut arena = DomArena::new();
        let (parent, c) = parent_with_children(&mut arena, 1);

        assert!(matches!(
            arena.append_child(c[0], parent),
            Err(DomError::HierarchyRequest { .. })
        ));
        assert!(matches!(
            arena.append_child(parent, parent),
            Err(DomError::HierarchyRequest { .. })
        ));
        assert_eq!(arena.children(parent).unwrap(), &c[..]);
    }

    #[test]
    fn test_text_nodes_cannot_have_children() {
        let mut arena = DomArena::new();
        let text = arena.create_text_node("hi");
        let span = arena.create_element("span");
        assert!(matches!(
            arena.append_child(text, span),
            Err(DomError::HierarchyRequest { .. })
        ));
    }

    #[test]
    fn test_insert_before_foreign_reference() {
        let mut arena = DomArena::new();
        let (parent, _) = parent_with_children(&mut arena, 1);
        let stranger = arena.create_element("b");
        let node = arena.create_element("i");

        assert!(matches!(
            arena.insert_before(parent, node, Some(stranger)),
            Err(DomError::NotAChild { .. })
        ));
        assert_eq!(arena.parent(node).unwrap(), None);
    }

    #[test]
    fn test_remove_child() {
        let mut arena = DomArena::new();
        let (parent, c) = parent_with_children(&mut arena, 2);

        assert_eq!(arena.remove_child(parent, c[0]).unwrap(), c[0]);
        assert_eq!(arena.children(parent).unwrap(), &[c[1]]);
        assert_eq!(arena.parent(c[0]).unwrap(), None);

        assert!(matches!(
            arena.remove_child(parent, c[0]),
            Err(DomError::NotAChild { .. })
        ));
    }

    #[test]
    fn test_traverse_df() {
        let mut arena = DomArena::new();
        let (root, c) = parent_with_children(&mut arena, 2);
        let text = arena.create_text_node("leaf");
        arena.append_child(c[0], text).unwrap();

        let mut visited = Vec::new();
        arena
            .traverse_df(root, |node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["DIV", "SPAN", "#text", "SPAN"]);
    }

    #[test]
    fn test_find_descendant_tree_order() {
        let mut arena = DomArena::new();
        let (root, c) = parent_with_children(&mut arena, 2);
        let nested = arena.create_element("span");
        arena.append_child(c[0], nested).unwrap();

        let found = arena
            .find_descendant(root, |node| Ok(node.has_tag("span") && node.node_id != c[0]))
            .unwrap();
        assert_eq!(found, Some(nested));

        let none = arena.find_descendant(root, |n| Ok(n.has_tag("div"))).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn test_document_skeleton() {
        let (arena, root) = DomArena::document_skeleton();
        assert_eq!(arena.len(), 4);
        assert_eq!(arena.get(root).unwrap().node_type, NodeType::Document);

        let html = arena.first_child(root).unwrap().unwrap();
        assert!(arena.get(html).unwrap().has_tag("html"));
        let names: Vec<&str> = arena
            .children(html)
            .unwrap()
            .iter()
            .map(|&id| arena.get(id).unwrap().node_name.as_str())
            .collect();
        assert_eq!(names, vec!["HEAD", "BODY"]);
        assert_eq!(arena.parent(html).unwrap(), Some(root));
    }
}
