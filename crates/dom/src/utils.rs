//! Utility functions for DOM processing

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{NodeId, NodeType};

/// Concatenated data of every descendant text node, in tree order
pub fn text_content(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let node = arena.get(node_id)?;
    if matches!(node.node_type, NodeType::Text | NodeType::Comment) {
        return Ok(node.node_value.clone());
    }

    let mut text = String::new();
    arena.traverse_df(node_id, |node| {
        if node.node_type == NodeType::Text {
            text.push_str(&node.node_value);
        }
        Ok(())
    })?;

    Ok(text)
}

/// Replace all children with a single text node (none for empty text)
pub fn set_text_content(arena: &mut DomArena, node_id: NodeId, text: &str) -> Result<()> {
    let node = arena.get(node_id)?;
    if matches!(node.node_type, NodeType::Text | NodeType::Comment) {
        arena.get_mut(node_id)?.node_value = text.to_string();
        return Ok(());
    }

    let children: Vec<NodeId> = node.children_ids.to_vec();
    for child in children {
        arena.remove_child(node_id, child)?;
    }
    if !text.is_empty() {
        let text_node = arena.create_text_node(text);
        arena.append_child(node_id, text_node)?;
    }
    Ok(())
}
