//! Getter methods for `CrawlConfig`

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::CrawlConfig;

impl CrawlConfig {
    #[must_use]
    pub fn storage_dir(&self) -> &PathBuf {
        &self.storage_dir
    }

    #[must_use]
    pub fn filter_profile(&self) -> &str {
        &self.filter_profile
    }

    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    #[must_use]
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    #[must_use]
    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }

    #[must_use]
    pub fn met_capacity(&self) -> usize {
        self.met_capacity
    }

    #[must_use]
    pub fn met_error_rate(&self) -> f64 {
        self.met_error_rate
    }

    #[must_use]
    pub fn saved_capacity(&self) -> usize {
        self.saved_capacity
    }

    #[must_use]
    pub fn saved_error_rate(&self) -> f64 {
        self.saved_error_rate
    }

    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    #[must_use]
    pub fn keep_query(&self) -> bool {
        self.keep_query
    }

    #[must_use]
    pub fn shed_threshold(&self) -> f64 {
        self.shed_threshold
    }

    #[must_use]
    pub fn shed_keep_probability(&self) -> f64 {
        self.shed_keep_probability
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    #[must_use]
    pub fn excluded_patterns(&self) -> Option<&[String]> {
        self.excluded_patterns.as_deref()
    }

    /// Most links one processed page may add to the frontier
    #[must_use]
    pub fn max_inserts_per_page(&self) -> usize {
        ((self.max_insert_ratio * self.max_queue_size as f64) as usize).max(1)
    }

    /// How long a stopping epoch waits for workers before giving up on them
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.interval_ms * 10 / 8) + Duration::from_secs(2)
    }

    /// True if a discovered link matches any excluded pattern
    #[must_use]
    pub fn is_excluded(&self, url: &str) -> bool {
        self.excluded_patterns_compiled
            .iter()
            .any(|re| re.is_match(url))
    }

    #[must_use]
    pub fn met_urls_dir(&self) -> PathBuf {
        self.storage_dir.join(crate::crawl_engine::persistence::MET_URLS_DIR)
    }

    #[must_use]
    pub fn saved_urls_dir(&self) -> PathBuf {
        self.storage_dir.join(crate::crawl_engine::persistence::SAVED_URLS_DIR)
    }

    #[must_use]
    pub fn saved_files_dir(&self) -> PathBuf {
        self.storage_dir.join(crate::crawl_engine::persistence::SAVED_FILES_DIR)
    }

    #[must_use]
    pub fn snapshots_dir(&self) -> PathBuf {
        self.storage_dir.join(crate::crawl_engine::persistence::SNAPSHOTS_DIR)
    }

    /// Point the config at another crawl directory (used when a saved crawl moved)
    pub(crate) fn relocate(&mut self, dir: &Path) {
        self.storage_dir = dir.to_path_buf();
    }
}
