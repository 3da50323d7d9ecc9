//! Progress reporting abstraction for crawl operations
//!
//! Defines the `ProgressReporter` trait for lifecycle event reporting
//! and provides no-op and logging implementations.

/// Trait for reporting crawl progress at key lifecycle events
///
/// Implementations can send updates to channels, log to console, update UI, etc.
pub trait ProgressReporter: Send + Sync {
    /// Report that an epoch has started
    fn report_epoch_started(&self, epoch: usize);

    /// Report that a URL was fetched successfully
    fn report_page_fetched(&self, url: &str);

    /// Report that a page was persisted to the content store
    fn report_page_saved(&self, url: &str, content_filename: &str);

    /// Report that a snapshot was written
    fn report_snapshot(&self, name: &str);

    /// Report a per-item error that did not stop the crawl
    fn report_error(&self, error: &str);
}

/// Progress reporter that does nothing
///
/// All methods are no-ops and will be inlined away by the compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_epoch_started(&self, _epoch: usize) {}

    #[inline(always)]
    fn report_page_fetched(&self, _url: &str) {}

    #[inline(always)]
    fn report_page_saved(&self, _url: &str, _content_filename: &str) {}

    #[inline(always)]
    fn report_snapshot(&self, _name: &str) {}

    #[inline(always)]
    fn report_error(&self, _error: &str) {}
}

/// Progress reporter that writes through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report_epoch_started(&self, epoch: usize) {
        log::info!(target: "snapcrawl::progress", "Epoch {epoch} started");
    }

    fn report_page_fetched(&self, url: &str) {
        log::debug!(target: "snapcrawl::progress", "Fetched {url}");
    }

    fn report_page_saved(&self, url: &str, content_filename: &str) {
        log::info!(target: "snapcrawl::progress", "Saved {url} as {content_filename}");
    }

    fn report_snapshot(&self, name: &str) {
        log::info!(target: "snapcrawl::progress", "Snapshot {name} written");
    }

    fn report_error(&self, error: &str) {
        log::warn!(target: "snapcrawl::progress", "{error}");
    }
}
