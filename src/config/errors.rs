//! Configuration errors
//!
//! All of these are fatal at construction time.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// A numeric option is out of range
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// No filter profile registered under this name
    #[error("Unknown filter profile '{0}'")]
    UnknownFilterProfile(String),

    /// An excluded-URL glob did not compile
    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
