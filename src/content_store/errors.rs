//! Error types for content store operations

use thiserror::Error;

/// Result type alias for content store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Parameter file, entry log or snapshot directory is missing
    #[error("Content store file not found: {0}")]
    NotFound(String),

    /// On-disk state cannot be trusted (unparseable log, missing blob)
    #[error("Content store is corrupt: {0}")]
    Corrupt(String),

    /// Unknown open mode string
    #[error("Invalid store mode '{0}' (expected fresh, append or full-load)")]
    InvalidMode(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error while writing
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
