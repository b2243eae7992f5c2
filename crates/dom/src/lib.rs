//! In-memory DOM for page helpers
//!
//! Arena-backed document tree with the primitives browser helper code relies
//! on: tree mutation, class token sets, CSS selector lookup and base URL
//! resolution.
//!
//! ## Core Design
//!
//! ```text
//! Document ─┬─ DomArena: Vec<DomNode>, links are NodeId (u32)
//!           ├─ url (+ first <base href>) → base_url()
//!           └─ SelectorList::parse → matches(arena, node)
//! ```

pub mod arena;
pub mod class_list;
pub mod document;
pub mod error;
pub mod selector;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use class_list::ClassList;
pub use document::Document;
pub use error::{DomError, Result};
pub use selector::SelectorList;
pub use types::*;
pub use url::Url;
