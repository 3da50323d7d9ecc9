//! Core types and traits for crawl operations.
//!
//! This module contains the error taxonomy, the two seams to the outside
//! world (`Fetcher`, `LinkExtractor`), and the per-epoch state machine.

use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;
use crate::content_store::StoreError;
use crate::sketch::SketchError;

/// Per-URL fetch failure; never escalates past the worker loop
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Fetch timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Top-level error for engine construction, persistence and runs
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sketch error: {0}")]
    Sketch(#[from] SketchError),

    #[error("Content store error: {0}")]
    Store(#[from] StoreError),

    #[error("Fetcher error: {0}")]
    Fetch(#[from] FetchError),

    /// Live crawl state file missing
    #[error("Crawl state not found: {0}")]
    NotFound(String),

    /// Snapshot missing or inconsistent
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking persistence task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Crawl operation was cancelled")]
    Cancelled,

    #[error("Crawl error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // Use {:#} to preserve full error chain with context
        Self::Other(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;

/// Retrieves page bytes
///
/// Implementations must enforce their own timeout and report any failure as
/// a `FetchError`; there is no partial-content contract.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        headers: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>>;
}

/// Pulls absolute http(s) links out of fetched content
pub trait LinkExtractor: Send + Sync {
    /// Links in `content`, with relative references resolved against `base_url`
    fn extract_links(&self, content: &[u8], base_url: &str) -> HashSet<String>;

    /// Page title, if the content has one
    fn extract_title(&self, _content: &[u8]) -> Option<String> {
        None
    }
}

/// Phase of one crawl epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochPhase {
    Idle,
    Running,
    Draining,
    Snapshotting,
}

impl fmt::Display for EpochPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Snapshotting => write!(f, "snapshotting"),
        }
    }
}

/// Options for `CrawlEngine::run`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub epoch_count: usize,
    pub secs_per_epoch: u64,
    /// Index of the first epoch, for log continuity across resumes
    pub start_epoch: usize,
    pub make_snapshot: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            epoch_count: 2,
            secs_per_epoch: 30,
            start_epoch: 0,
            make_snapshot: true,
        }
    }
}
