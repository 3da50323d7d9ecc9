//! Crawl counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct CrawlMetrics {
    pub(crate) fetched: AtomicU64,
    pub(crate) fetch_failed: AtomicU64,
    pub(crate) extract_failed: AtomicU64,
    pub(crate) saved: AtomicU64,
    pub(crate) skipped_seen: AtomicU64,
    pub(crate) skipped_saved: AtomicU64,
    pub(crate) shed: AtomicU64,
    pub(crate) enqueued: AtomicU64,
    pub(crate) dropped_full: AtomicU64,
    pub(crate) excluded: AtomicU64,
}

/// Point-in-time copy of [`CrawlMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    pub fetched: u64,
    pub fetch_failed: u64,
    pub extract_failed: u64,
    pub saved: u64,
    pub skipped_seen: u64,
    pub skipped_saved: u64,
    pub shed: u64,
    pub enqueued: u64,
    pub dropped_full: u64,
    pub excluded: u64,
}

#[inline]
pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl CrawlMetrics {
    #[must_use]
    pub fn snapshot(&self) -> CrawlStats {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CrawlStats {
            fetched: get(&self.fetched),
            fetch_failed: get(&self.fetch_failed),
            extract_failed: get(&self.extract_failed),
            saved: get(&self.saved),
            skipped_seen: get(&self.skipped_seen),
            skipped_saved: get(&self.skipped_saved),
            shed: get(&self.shed),
            enqueued: get(&self.enqueued),
            dropped_full: get(&self.dropped_full),
            excluded: get(&self.excluded),
        }
    }
}
