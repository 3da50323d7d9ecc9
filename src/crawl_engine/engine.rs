//! The crawl engine and its constructors
//!
//! `CrawlEngine` exclusively owns the frontier, both sketches and the content
//! store. Workers borrow them through a `WorkerContext` for one epoch at a
//! time and never keep state across iterations.

use log::info;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use super::admission::{AdmissionPolicy, Sampler, ThreadSampler};
use super::crawl_types::{CrawlResult, EpochPhase, Fetcher, LinkExtractor};
use super::frontier::Frontier;
use super::metrics::{CrawlMetrics, CrawlStats};
use super::page_processor::WorkerContext;
use super::persistence::ENGINE_PARAMS_FILE;
use super::progress::{LogProgress, ProgressReporter};
use super::shutdown::StopSignal;
use crate::config::CrawlConfig;
use crate::content_store::{ContentStore, StoreMode};
use crate::filters::{FilterProfile, FilterRegistry};
use crate::page_extractor::{HtmlLinkExtractor, HttpFetcher};
use crate::sketch::MembershipSketch;

pub struct CrawlEngine {
    pub(crate) config: CrawlConfig,
    pub(crate) profile: FilterProfile,
    pub(crate) frontier: Arc<Frontier>,
    pub(crate) met_urls: Arc<MembershipSketch>,
    pub(crate) saved_urls: Arc<MembershipSketch>,
    pub(crate) store: Arc<ContentStore>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) extractor: Arc<dyn LinkExtractor>,
    pub(crate) sampler: Arc<dyn Sampler>,
    pub(crate) progress: Arc<dyn ProgressReporter>,
    pub(crate) metrics: Arc<CrawlMetrics>,
    /// Per-epoch signal observed by workers
    pub(crate) epoch_stop: Arc<StopSignal>,
    /// Run-level signal raised by `request_stop`
    pub(crate) halt: Arc<StopSignal>,
    pub(crate) phase: Mutex<EpochPhase>,
}

impl std::fmt::Debug for CrawlEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlEngine")
            .field("storage_dir", self.config.storage_dir())
            .field("profile", &self.profile.name())
            .field("frontier_len", &self.frontier.len())
            .field("stored", &self.store.len())
            .field("phase", &*self.phase.lock())
            .finish_non_exhaustive()
    }
}

/// Parts an engine is assembled from, whichever way they were obtained
pub(crate) struct EngineParts {
    pub(crate) config: CrawlConfig,
    pub(crate) frontier_contents: Vec<String>,
    pub(crate) met_urls: MembershipSketch,
    pub(crate) saved_urls: MembershipSketch,
    pub(crate) store: ContentStore,
}

impl CrawlEngine {
    /// Start a new crawl in `config.storage_dir()`, discarding anything there
    ///
    /// The previous engine params, sketches, store and snapshots are removed
    /// and an empty state is saved before returning.
    ///
    /// Uses `HttpFetcher`, `HtmlLinkExtractor`, a thread-local sampler and
    /// log-based progress; swap them with the `with_*` methods.
    ///
    /// # Errors
    ///
    /// Returns `CrawlError::Config` for an unknown filter profile, sketch
    /// errors for unusable capacity/error-rate pairs, and IO errors if the
    /// crawl directory cannot be prepared.
    pub fn create(config: CrawlConfig, registry: &FilterRegistry) -> CrawlResult<Self> {
        let profile = registry.resolve(config.filter_profile())?;
        let met_urls = MembershipSketch::with_capacity(config.met_capacity(), config.met_error_rate())?;
        let saved_urls =
            MembershipSketch::with_capacity(config.saved_capacity(), config.saved_error_rate())?;

        fs::create_dir_all(config.storage_dir())?;
        // Engine params go first: until the initial save below, `open` refuses
        // the directory instead of mixing old parts with new ones
        let params = config.storage_dir().join(ENGINE_PARAMS_FILE);
        if params.exists() {
            fs::remove_file(&params)?;
        }
        for dir in [
            config.met_urls_dir(),
            config.saved_urls_dir(),
            config.snapshots_dir(),
        ] {
            if dir.exists() {
                fs::remove_dir_all(&dir)?;
            }
        }
        fs::create_dir_all(config.met_urls_dir())?;
        fs::create_dir_all(config.saved_urls_dir())?;
        fs::create_dir_all(config.snapshots_dir())?;
        let store = ContentStore::open(config.saved_files_dir(), StoreMode::Fresh)?;

        info!(
            target: "snapcrawl::engine",
            "Created crawl at {} (profile={}, workers={}, frontier capacity={}, seen sketch {}x{}, saved sketch {}x{})",
            config.storage_dir().display(),
            profile.name(),
            config.max_workers(),
            config.max_queue_size(),
            met_urls.size(),
            met_urls.hash_func_count(),
            saved_urls.size(),
            saved_urls.hash_func_count(),
        );

        let engine = Self::assemble(
            EngineParts {
                config,
                frontier_contents: Vec::new(),
                met_urls,
                saved_urls,
                store,
            },
            profile,
        )?;
        engine.save()?;
        Ok(engine)
    }

    pub(crate) fn assemble(parts: EngineParts, profile: FilterProfile) -> CrawlResult<Self> {
        let fetcher = HttpFetcher::from_config(&parts.config)?;
        let frontier = Frontier::new(parts.config.max_queue_size());
        let dropped = frontier.restore(parts.frontier_contents);
        if dropped > 0 {
            log::warn!(
                target: "snapcrawl::engine",
                "Dropped {dropped} frontier URLs beyond capacity {}",
                frontier.capacity()
            );
        }

        Ok(Self {
            config: parts.config,
            profile,
            frontier: Arc::new(frontier),
            met_urls: Arc::new(parts.met_urls),
            saved_urls: Arc::new(parts.saved_urls),
            store: Arc::new(parts.store),
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(HtmlLinkExtractor),
            sampler: Arc::new(ThreadSampler),
            progress: Arc::new(LogProgress),
            metrics: Arc::new(CrawlMetrics::default()),
            epoch_stop: Arc::new(StopSignal::new()),
            halt: Arc::new(StopSignal::new()),
            phase: Mutex::new(EpochPhase::Idle),
        })
    }

    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    #[must_use]
    pub fn with_link_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn with_sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.sampler = sampler;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Replace the filter profile (same name expected; used for custom predicates)
    #[must_use]
    pub fn with_profile(mut self, profile: FilterProfile) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    #[must_use]
    pub fn profile(&self) -> &FilterProfile {
        &self.profile
    }

    #[must_use]
    pub fn frontier(&self) -> &Arc<Frontier> {
        &self.frontier
    }

    #[must_use]
    pub fn met_urls(&self) -> &Arc<MembershipSketch> {
        &self.met_urls
    }

    #[must_use]
    pub fn saved_urls(&self) -> &Arc<MembershipSketch> {
        &self.saved_urls
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    #[must_use]
    pub fn phase(&self) -> EpochPhase {
        *self.phase.lock()
    }

    pub(crate) fn set_phase(&self, phase: EpochPhase) {
        let mut current = self.phase.lock();
        log::debug!(target: "snapcrawl::engine", "Phase {} -> {phase}", *current);
        *current = phase;
    }

    #[must_use]
    pub fn stats(&self) -> CrawlStats {
        self.metrics.snapshot()
    }

    /// Number of entries held by the content store
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.store.len()
    }

    /// Enqueue seed URLs without blocking; returns how many were accepted
    pub fn seed<I, S>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .map(|u| self.frontier.try_push(u.into()))
            .filter(|&pushed| pushed)
            .count()
    }

    /// Push `count` randomly chosen profile seeds; returns how many fit
    pub fn reseed_random(&self, count: usize) -> usize {
        use rand::seq::IndexedRandom;

        let seeds = self.profile.seeds();
        if seeds.is_empty() {
            return 0;
        }
        let picks: Vec<String> = {
            let mut rng = rand::rng();
            (0..count)
                .filter_map(|_| seeds.choose(&mut rng).cloned())
                .collect()
        };
        self.seed(picks)
    }

    /// Ask a running `run` to finish its current epoch early and return
    pub fn request_stop(&self) {
        self.halt.raise();
    }

    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.halt.is_raised()
    }

    pub(crate) fn worker_context(&self) -> WorkerContext {
        let mut headers = HashMap::new();
        headers.insert("User-Agent".to_string(), self.config.user_agent().to_string());
        WorkerContext {
            config: self.config.clone(),
            profile: self.profile.clone(),
            policy: AdmissionPolicy::from_config(&self.config),
            frontier: Arc::clone(&self.frontier),
            met_urls: Arc::clone(&self.met_urls),
            saved_urls: Arc::clone(&self.saved_urls),
            store: Arc::clone(&self.store),
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            sampler: Arc::clone(&self.sampler),
            progress: Arc::clone(&self.progress),
            metrics: Arc::clone(&self.metrics),
            stop: Arc::clone(&self.epoch_stop),
            headers,
        }
    }
}
