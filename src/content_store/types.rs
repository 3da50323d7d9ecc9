//! Entry and parameter types for the content store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::StoreError;

/// Content submitted for storage
#[derive(Debug, Clone)]
pub struct InsertRecord {
    pub content: Vec<u8>,
    pub url: String,
    pub title: String,
    pub fetched_at: DateTime<Utc>,
}

impl InsertRecord {
    /// Record stamped with the current time
    pub fn new(content: Vec<u8>, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            content,
            url: url.into(),
            title: title.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// Log entry for stored content; the bytes live in `contents/<content_filename>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEntry {
    pub content_filename: String,
    pub url: String,
    pub title: String,
    pub fetched_at: DateTime<Utc>,
}

/// Durable store parameters (`store.json`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreParams {
    pub filename_counter: u64,
}

/// How a store treats what is already on disk when opened
///
/// Chosen per open; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreMode {
    /// Wipe the directory and start empty
    Fresh,
    /// Leave the on-disk log alone; hold only new entries and merge them on save
    #[default]
    Append,
    /// Read the whole on-disk log into memory
    FullLoad,
}

impl FromStr for StoreMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fresh" | "overwrite" => Ok(Self::Fresh),
            "append" => Ok(Self::Append),
            "full-load" | "full_load" | "append-full-load" => Ok(Self::FullLoad),
            other => Err(StoreError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => write!(f, "fresh"),
            Self::Append => write!(f, "append"),
            Self::FullLoad => write!(f, "full-load"),
        }
    }
}
