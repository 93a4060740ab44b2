//! Typed errors for the domain knowledge library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Invalid observations are not errors: the facade drops them and returns
//! `Ok(None)`. Likewise "no reliable answer yet" is an absent value.

use thiserror::Error;

/// Errors that can occur while recording or querying observations.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl KnowledgeError {
    /// Wrap any backend error as a storage failure.
    pub fn storage(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Storage(err.into())
    }
}

/// Result type alias for domain knowledge operations.
pub type Result<T> = std::result::Result<T, KnowledgeError>;
