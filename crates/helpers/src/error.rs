//! Error types for the helper functions
//!
//! DOM failures pass through untouched; helpers never wrap or retry them.

use dom::DomError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HelperError>;

#[derive(Debug, Error)]
pub enum HelperError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("Debounce needs a running tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
