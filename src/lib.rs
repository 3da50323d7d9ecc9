//! Bounded, recoverable, multi-worker web crawler
//!
//! A [`CrawlEngine`] owns a bounded frontier, a seen-URL and a saved-URL
//! [`MembershipSketch`], and a [`ContentStore`]. It runs in epochs; each epoch
//! ends by stopping every worker, optionally writing a named snapshot, and
//! saving the live state so the crawl can be resumed or rolled back.

pub mod config;
pub mod content_store;
pub mod crawl_engine;
pub mod filters;
pub mod page_extractor;
pub mod sketch;
pub mod utils;

pub use config::{ConfigError, CrawlConfig};
pub use content_store::{ContentStore, InsertRecord, RecordedEntry, StoreError, StoreMode};
pub use crawl_engine::{
    CrawlEngine, CrawlError, CrawlResult, CrawlStats, EpochPhase, FetchError, Fetcher,
    LinkExtractor, NoOpProgress, ProgressReporter, RunOptions, latest_snapshot, list_snapshots,
};
pub use filters::{FilterProfile, FilterRegistry};
pub use page_extractor::{HtmlLinkExtractor, HttpFetcher};
pub use sketch::{BitSequence, MembershipSketch, SketchError};
