//! Test utilities and helper functions for the snapcrawl test suite

use futures::future::BoxFuture;
use kodegen_tools_snapcrawl::config::CrawlConfig;
use kodegen_tools_snapcrawl::crawl_engine::{FetchError, Fetcher};
use kodegen_tools_snapcrawl::filters::{FilterProfile, FilterRegistry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;

/// Host every fake page lives on
#[allow(dead_code)]
pub const TEST_HOST: &str = "https://news.example.test";

/// Name of the profile registered by [`test_registry`]
#[allow(dead_code)]
pub const TEST_PROFILE: &str = "example";

/// Builds an absolute URL on [`TEST_HOST`]
#[allow(dead_code)]
pub fn test_url(path: &str) -> String {
    format!("{TEST_HOST}{path}")
}

/// Creates a test HTML document with a title and the given links
#[allow(dead_code)]
pub fn create_test_html(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{href}\">{href}</a>\n"))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body>
    {anchors}
</body>
</html>"#
    )
}

/// Strict: `/articles/...`; loose: anything on the test host
#[allow(dead_code)]
pub fn test_profile() -> FilterProfile {
    FilterProfile::new(
        TEST_PROFILE,
        |url| url.starts_with(&format!("{TEST_HOST}/articles/")),
        |url| url.starts_with(TEST_HOST),
    )
}

/// Built-in profiles plus [`test_profile`]
#[allow(dead_code)]
pub fn test_registry() -> FilterRegistry {
    let mut registry = FilterRegistry::builtin();
    registry.register(test_profile());
    registry
}

/// Fast, deterministic config rooted at `storage_dir`
#[allow(dead_code)]
pub fn create_test_config(storage_dir: &Path, workers: usize, capacity: usize) -> CrawlConfig {
    CrawlConfig::builder()
        .storage_dir(storage_dir.to_path_buf())
        .filter_profile(TEST_PROFILE)
        .max_workers(workers)
        .interval_ms(0)
        .max_queue_size(capacity)
        .met_capacity(10_000)
        .saved_capacity(10_000)
        .error_rate(1e-4)
        .tick_interval_secs(1)
        .build()
        .expect("Failed to create test config")
}

/// In-memory fetcher: known URLs return their page, everything else 404s
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FakeFetcher {
    pages: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into().into_bytes());
        self
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|u| *u == url).count()
    }
}

impl Fetcher for FakeFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        _headers: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            self.requests.lock().push(url.to_string());
            self.pages.get(url).cloned().ok_or(FetchError::Status(404))
        })
    }
}
