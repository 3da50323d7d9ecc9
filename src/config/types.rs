//! Core configuration type for the crawl engine
//!
//! `CrawlConfig` carries every scalar the engine needs. It is serialized
//! into `crawler.json` on save/snapshot, so a resumed crawl picks up the
//! same worker count, delay, capacity and filter profile.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Crawl directory holding `met_urls/`, `saved_urls/`, `saved_files/`,
    /// `snapshots/` and `crawler.json`.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) storage_dir: PathBuf,

    /// Name resolved against a `FilterRegistry` when the engine is built
    pub(crate) filter_profile: String,

    pub(crate) max_workers: usize,

    /// Base per-URL delay; each worker sleeps `uniform(0.8, 1.2)` times this
    pub(crate) interval_ms: u64,

    /// Frontier capacity
    pub(crate) max_queue_size: usize,

    pub(crate) met_capacity: usize,
    pub(crate) met_error_rate: f64,
    pub(crate) saved_capacity: usize,
    pub(crate) saved_error_rate: f64,

    pub(crate) user_agent: String,

    /// Timeout applied to every fetch
    pub(crate) fetch_timeout_secs: u64,

    /// Keep query strings when canonicalizing discovered links
    pub(crate) keep_query: bool,

    /// Per-page cap on enqueued links, as a fraction of frontier capacity
    pub(crate) max_insert_ratio: f64,

    /// Fill ratio above which dequeued non-strict URLs are shed
    pub(crate) shed_threshold: f64,

    /// Chance a shed candidate survives
    pub(crate) shed_keep_probability: f64,

    pub(crate) tick_interval_secs: u64,

    pub(crate) excluded_patterns: Option<Vec<String>>,

    /// Compiled regex patterns from `excluded_patterns`
    /// Pre-compiled at config creation to avoid hot-path regex compilation
    #[serde(skip)]
    pub(crate) excluded_patterns_compiled: Vec<regex::Regex>,
}
