//! Browser page helpers
//!
//! Small, independent helpers for page scripts, built on the in-memory
//! [`dom`] crate and the tokio timer:
//!
//! | Helper | Does |
//! |---|---|
//! | [`query`] | value of one key in a querystring |
//! | [`serialize`] / [`serialize_value`] / [`serialize_pairs`] | key/value data to a querystring |
//! | [`select`] | first element matching a CSS selector |
//! | [`remove_node`] / [`insert_after`] | tree edits relative to a node |
//! | [`add_class`] / [`remove_class`] | class token edits |
//! | [`get_absolute_url`] | resolve against the document base URL |
//! | [`debounce`] | collapse bursts of calls into one trailing call |
//! | [`remove_item_by_index`] | in-place removal, no-op when out of range |
//!
//! Only [`Debounced`] keeps state; everything else runs to completion on the
//! caller's thread.

pub mod array;
pub mod debounce;
pub mod error;
pub mod node;
pub mod querystring;

pub use array::remove_item_by_index;
pub use debounce::{debounce, debounce_with_config, DebounceConfig, Debounced, DEFAULT_DELAY};
pub use error::{HelperError, Result};
pub use node::{
    add_class, get_absolute_url, insert_after, remove_class, remove_node, select, ClassNames,
};
pub use querystring::{query, serialize, serialize_pairs, serialize_value};

pub use dom::{Document, NodeId};
