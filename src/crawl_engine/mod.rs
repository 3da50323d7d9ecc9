//! Crawl Engine Module
//!
//! This module contains the bounded frontier, admission control, the worker
//! loop and the epoch orchestration that drive a crawl, plus the persistence
//! that makes a crawl resumable from a named snapshot.

// Sub-modules
pub mod admission;
pub mod engine;
pub mod crawl_types;
pub mod frontier;
pub mod link_processor;
pub mod metrics;
pub mod orchestrator;
pub mod page_processor;
pub mod persistence;
pub mod progress;
pub mod shutdown;

// Re-exports for public API
pub use engine::CrawlEngine;
pub use crawl_types::{
    CrawlError, CrawlResult, EpochPhase, FetchError, Fetcher, LinkExtractor, RunOptions,
};
pub use frontier::Frontier;

// Admission control and load shedding
pub use admission::{
    AdmissionPolicy, FixedSampler, LinkClass, Sampler, SeededSampler, ThreadSampler,
    loose_admission_probability,
};

// Worker-level types for custom drivers
pub use link_processor::{LinkBatchOutcome, enqueue_discovered_links};
pub use page_processor::{PageOutcome, WorkerContext, process_url, worker_loop};

// Persistence
pub use persistence::{
    ENGINE_PARAMS_FILE, EngineState, MET_URLS_DIR, SAVED_FILES_DIR, SAVED_URLS_DIR,
    SNAPSHOTS_DIR, latest_snapshot, list_snapshots,
};

pub use metrics::{CrawlMetrics, CrawlStats};
pub use progress::{LogProgress, NoOpProgress, ProgressReporter};
pub use shutdown::StopSignal;
