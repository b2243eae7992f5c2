//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. Each variant maps onto the DOMException a
//! browser would raise for the same misuse.

use crate::types::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// NotFoundError: the node is not a child of the given parent
    #[error("Node {child} is not a child of node {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Node {0} has no parent")]
    NoParent(NodeId),

    /// HierarchyRequestError: inserting would create a cycle or the parent
    /// cannot hold children
    #[error("Cannot insert node {child} into node {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Class token must not be empty")]
    EmptyToken,

    #[error("Class token contains whitespace: {0:?}")]
    InvalidTokenCharacter(String),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("CDP protocol error: {0}")]
    CdpError(String),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
