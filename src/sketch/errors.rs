//! Error types for sketch operations

use thiserror::Error;

/// Result type alias for sketch operations
pub type SketchResult<T> = Result<T, SketchError>;

/// Error types for `BitSequence` and `MembershipSketch`
#[derive(Debug, Error)]
pub enum SketchError {
    /// Constructor argument outside its valid domain
    #[error("Invalid sketch argument: {0}")]
    InvalidArgument(String),

    /// Bit index outside `[0, size)`
    #[error("Bit index {index} out of range for sequence of {size} bits")]
    IndexOutOfRange { index: usize, size: usize },

    /// A persisted sketch file is missing
    #[error("Sketch file not found: {0}")]
    NotFound(String),

    /// Persisted parameters disagree with the persisted bit buffer
    #[error("Sketch state is corrupt: {0}")]
    Corrupt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parameter file could not be (de)serialized
    #[error("Sketch metadata error: {0}")]
    Json(#[from] serde_json::Error),
}
