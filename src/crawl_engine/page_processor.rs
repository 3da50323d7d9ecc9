//! One worker iteration: shed, dedupe, fetch, persist, discover

use log::{debug, error, info, warn};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::admission::{AdmissionPolicy, Sampler};
use super::crawl_types::{Fetcher, LinkExtractor};
use super::frontier::Frontier;
use super::link_processor::{LinkBatchOutcome, enqueue_discovered_links};
use super::metrics::{CrawlMetrics, bump};
use super::progress::ProgressReporter;
use super::shutdown::StopSignal;
use crate::config::CrawlConfig;
use crate::content_store::{ContentStore, InsertRecord};
use crate::filters::FilterProfile;
use crate::sketch::MembershipSketch;
use crate::utils::UNTITLED;

/// Everything a worker needs for one epoch
pub struct WorkerContext {
    pub config: CrawlConfig,
    pub profile: FilterProfile,
    pub policy: AdmissionPolicy,
    pub frontier: Arc<Frontier>,
    pub met_urls: Arc<MembershipSketch>,
    pub saved_urls: Arc<MembershipSketch>,
    pub store: Arc<ContentStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub extractor: Arc<dyn LinkExtractor>,
    pub sampler: Arc<dyn Sampler>,
    pub progress: Arc<dyn ProgressReporter>,
    pub metrics: Arc<CrawlMetrics>,
    pub stop: Arc<StopSignal>,
    pub headers: HashMap<String, String>,
}

/// Result of processing one dequeued URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Discarded by dequeue-time load shedding
    Shed,
    /// Already in the seen sketch
    AlreadySeen,
    /// Fetch failed; the URL is not marked seen
    FetchFailed,
    /// Fetched but the extractor failed; seen, nothing stored or enqueued
    ExtractFailed,
    Visited {
        saved: bool,
        links: LinkBatchOutcome,
    },
}

/// `uniform(0.8, 1.2) * interval_ms`
fn jittered_delay(interval_ms: u64) -> Duration {
    if interval_ms == 0 {
        return Duration::ZERO;
    }
    let factor: f64 = rand::rng().random_range(0.8..=1.2);
    Duration::from_secs_f64(interval_ms as f64 * factor / 1000.0)
}

/// Process a single dequeued URL
///
/// 1. Shed it if the frontier is crowded and it fails the strict filter
/// 2. Skip it if already seen, unless it is a bypass seed
/// 3. Fetch; a failure ends the iteration
/// 4. Mark seen and extract; an extractor failure drops the page
/// 5. Persist if strict and not yet saved
/// 6. Canonicalize and enqueue links
/// 7. Sleep the jittered delay, cut short by the stop signal
pub async fn process_url(ctx: &WorkerContext, worker: &str, url: String) -> PageOutcome {
    let passes_strict = ctx.profile.is_strict(&url);

    if ctx.policy.should_shed(
        ctx.frontier.len(),
        ctx.frontier.capacity(),
        passes_strict,
        ctx.sampler.as_ref(),
    ) {
        bump(&ctx.metrics.shed);
        debug!(target: "snapcrawl::worker", "{worker}: shed {url}");
        return PageOutcome::Shed;
    }

    if !ctx.profile.bypasses_seen(&url) && ctx.met_urls.contains(&url) {
        bump(&ctx.metrics.skipped_seen);
        debug!(target: "snapcrawl::worker", "{worker}: {url} has been met");
        return PageOutcome::AlreadySeen;
    }

    let outcome = match ctx.fetcher.fetch(&url, &ctx.headers).await {
        Ok(content) => visit(ctx, worker, &url, passes_strict, content).await,
        Err(e) => {
            bump(&ctx.metrics.fetch_failed);
            warn!(target: "snapcrawl::worker", "{worker}: fetch failed for {url}: {e}");
            ctx.progress.report_error(&format!("fetch failed for {url}: {e}"));
            PageOutcome::FetchFailed
        }
    };

    let delay = jittered_delay(ctx.config.interval_ms());
    if !delay.is_zero() {
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = ctx.stop.wait() => {}
        }
    }
    outcome
}

async fn visit(
    ctx: &WorkerContext,
    worker: &str,
    url: &str,
    passes_strict: bool,
    content: Vec<u8>,
) -> PageOutcome {
    bump(&ctx.metrics.fetched);
    ctx.met_urls.add(url);
    ctx.progress.report_page_fetched(url);
    info!(target: "snapcrawl::worker", "{worker}: {url}: crawled");

    // Parsing is CPU-bound; keep it off the async workers
    let extractor = Arc::clone(&ctx.extractor);
    let base = url.to_string();
    let parsed = tokio::task::spawn_blocking(move || {
        let links = extractor.extract_links(&content, &base);
        let title = extractor.extract_title(&content);
        (links, title, content)
    })
    .await;
    let (links, title, content) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            bump(&ctx.metrics.extract_failed);
            error!(target: "snapcrawl::worker", "{worker}: extraction for {url} failed, page dropped: {e}");
            ctx.progress.report_error(&format!("extraction for {url} failed: {e}"));
            return PageOutcome::ExtractFailed;
        }
    };

    let saved = passes_strict && persist(ctx, worker, url, title, content).await;
    if !passes_strict {
        debug!(target: "snapcrawl::worker", "{worker}: {url}: not saved");
    }

    let links = enqueue_discovered_links(ctx, url, links);
    PageOutcome::Visited { saved, links }
}

/// Store `content` unless the saved sketch already holds `url`
///
/// The URL enters the saved sketch only after the blob is written, so a
/// failed write leaves it eligible next time it is fetched.
async fn persist(
    ctx: &WorkerContext,
    worker: &str,
    url: &str,
    title: Option<String>,
    content: Vec<u8>,
) -> bool {
    if ctx.saved_urls.contains(url) {
        bump(&ctx.metrics.skipped_saved);
        debug!(target: "snapcrawl::worker", "{worker}: {url}: already saved");
        return false;
    }

    let record = InsertRecord::new(content, url, title.unwrap_or_else(|| UNTITLED.to_string()));
    let store = Arc::clone(&ctx.store);
    match tokio::task::spawn_blocking(move || store.insert(record)).await {
        Ok(Ok(entry)) => {
            ctx.saved_urls.add(url);
            bump(&ctx.metrics.saved);
            ctx.progress.report_page_saved(url, &entry.content_filename);
            info!(
                target: "snapcrawl::worker",
                "{worker}: {url}: saved as {}",
                entry.content_filename
            );
            true
        }
        Ok(Err(e)) => {
            error!(target: "snapcrawl::worker", "{worker}: storing {url} failed: {e}");
            ctx.progress.report_error(&format!("storing {url} failed: {e}"));
            false
        }
        Err(e) => {
            error!(target: "snapcrawl::worker", "{worker}: store task for {url} failed: {e}");
            false
        }
    }
}

/// Worker body: poll the frontier until the stop signal is raised
pub async fn worker_loop(ctx: Arc<WorkerContext>, name: String) {
    info!(target: "snapcrawl::worker", "{name} started");
    let poll = Duration::from_millis(crate::utils::DEQUEUE_TIMEOUT_MS);
    loop {
        if ctx.stop.is_raised() {
            info!(target: "snapcrawl::worker", "{name} sees the stop signal");
            break;
        }
        let next = tokio::select! {
            url = ctx.frontier.pop_timeout(poll) => url,
            () = ctx.stop.wait() => None,
        };
        if let Some(url) = next {
            process_url(&ctx, &name, url).await;
        }
    }
    info!(target: "snapcrawl::worker", "{name} stopped");
}
