//! Error types for the guidance engine.

use thiserror::Error;

/// Errors raised by an embedding provider.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Provider cannot be reached or failed to initialize
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),
    /// A text could not be encoded
    #[error("cannot encode text: {0}")]
    InvalidInput(String),
    /// Provider returned vectors that do not match the request
    #[error("malformed embedding output: expected {expected}, got {actual}")]
    Malformed { expected: String, actual: String },
}

/// Errors surfaced by the retrieval core.
#[derive(Debug, Error)]
pub enum GuidanceError {
    /// Malformed input, rejected before any mutation
    #[error("invalid input: {0}")]
    Validation(String),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Snapshot write failed; in-memory state is kept
    #[error("failed to persist collection '{collection}': {source}")]
    Persistence {
        collection: String,
        #[source]
        source: std::io::Error,
    },

    #[error("content store error: {0}")]
    Store(#[from] rusqlite::Error),
}

impl GuidanceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, GuidanceError>;
