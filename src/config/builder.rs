//! Type-safe builder for `CrawlConfig` using the typestate pattern
//!
//! The crawl directory and the filter profile must be set, in that order,
//! before `build()` becomes available.

use regex::Regex;
use std::marker::PhantomData;
use std::path::PathBuf;

use super::errors::ConfigError;
use super::types::CrawlConfig;
use crate::utils::{
    DEFAULT_ERROR_RATE, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_INTERVAL_MS, DEFAULT_MAX_INSERT_RATIO,
    DEFAULT_MAX_QUEUE_SIZE, DEFAULT_MAX_WORKERS, DEFAULT_MET_CAPACITY, DEFAULT_SAVED_CAPACITY,
    DEFAULT_SHED_KEEP_PROBABILITY, DEFAULT_SHED_THRESHOLD, DEFAULT_TICK_INTERVAL_SECS,
    SAFARI_USER_AGENT,
};

/// Compile a glob pattern into a regex
///
/// `*` matches any sequence; every other character matches itself.
///
/// # Errors
///
/// Returns `InvalidPattern` if the resulting regex pattern is invalid.
pub(crate) fn compile_glob_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    let regex_pattern = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    let anchored = format!("^{regex_pattern}$");
    Regex::new(&anchored).map_err(|e| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

// Type states for the builder
pub struct WithStorageDir;
pub struct WithFilterProfile;

pub struct CrawlConfigBuilder<State = ()> {
    pub(crate) storage_dir: Option<PathBuf>,
    pub(crate) filter_profile: Option<String>,
    pub(crate) max_workers: usize,
    pub(crate) interval_ms: u64,
    pub(crate) max_queue_size: usize,
    pub(crate) met_capacity: usize,
    pub(crate) met_error_rate: f64,
    pub(crate) saved_capacity: usize,
    pub(crate) saved_error_rate: f64,
    pub(crate) user_agent: String,
    pub(crate) fetch_timeout_secs: u64,
    pub(crate) keep_query: bool,
    pub(crate) max_insert_ratio: f64,
    pub(crate) shed_threshold: f64,
    pub(crate) shed_keep_probability: f64,
    pub(crate) tick_interval_secs: u64,
    pub(crate) excluded_patterns: Option<Vec<String>>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for CrawlConfigBuilder<()> {
    fn default() -> Self {
        Self {
            storage_dir: None,
            filter_profile: None,
            max_workers: DEFAULT_MAX_WORKERS,
            interval_ms: DEFAULT_INTERVAL_MS,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            met_capacity: DEFAULT_MET_CAPACITY,
            met_error_rate: DEFAULT_ERROR_RATE,
            saved_capacity: DEFAULT_SAVED_CAPACITY,
            saved_error_rate: DEFAULT_ERROR_RATE,
            user_agent: SAFARI_USER_AGENT.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            keep_query: false,
            max_insert_ratio: DEFAULT_MAX_INSERT_RATIO,
            shed_threshold: DEFAULT_SHED_THRESHOLD,
            shed_keep_probability: DEFAULT_SHED_KEEP_PROBABILITY,
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            excluded_patterns: None,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfig {
    /// Create a builder for configuring a `CrawlConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder::default()
    }
}

impl CrawlConfigBuilder<()> {
    pub fn storage_dir(self, dir: impl Into<PathBuf>) -> CrawlConfigBuilder<WithStorageDir> {
        let dir = dir.into();
        // Normalize to absolute so every derived path agrees
        let dir = std::path::absolute(&dir).unwrap_or(dir);

        CrawlConfigBuilder {
            storage_dir: Some(dir),
            filter_profile: self.filter_profile,
            max_workers: self.max_workers,
            interval_ms: self.interval_ms,
            max_queue_size: self.max_queue_size,
            met_capacity: self.met_capacity,
            met_error_rate: self.met_error_rate,
            saved_capacity: self.saved_capacity,
            saved_error_rate: self.saved_error_rate,
            user_agent: self.user_agent,
            fetch_timeout_secs: self.fetch_timeout_secs,
            keep_query: self.keep_query,
            max_insert_ratio: self.max_insert_ratio,
            shed_threshold: self.shed_threshold,
            shed_keep_probability: self.shed_keep_probability,
            tick_interval_secs: self.tick_interval_secs,
            excluded_patterns: self.excluded_patterns,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfigBuilder<WithStorageDir> {
    pub fn filter_profile(self, name: impl Into<String>) -> CrawlConfigBuilder<WithFilterProfile> {
        CrawlConfigBuilder {
            storage_dir: self.storage_dir,
            filter_profile: Some(name.into()),
            max_workers: self.max_workers,
            interval_ms: self.interval_ms,
            max_queue_size: self.max_queue_size,
            met_capacity: self.met_capacity,
            met_error_rate: self.met_error_rate,
            saved_capacity: self.saved_capacity,
            saved_error_rate: self.saved_error_rate,
            user_agent: self.user_agent,
            fetch_timeout_secs: self.fetch_timeout_secs,
            keep_query: self.keep_query,
            max_insert_ratio: self.max_insert_ratio,
            shed_threshold: self.shed_threshold,
            shed_keep_probability: self.shed_keep_probability,
            tick_interval_secs: self.tick_interval_secs,
            excluded_patterns: self.excluded_patterns,
            _phantom: PhantomData,
        }
    }
}

// Methods available in every state
impl<State> CrawlConfigBuilder<State> {
    #[must_use]
    pub fn max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    #[must_use]
    pub fn interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    #[must_use]
    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    #[must_use]
    pub fn met_capacity(mut self, capacity: usize) -> Self {
        self.met_capacity = capacity;
        self
    }

    #[must_use]
    pub fn saved_capacity(mut self, capacity: usize) -> Self {
        self.saved_capacity = capacity;
        self
    }

    /// Set the false-positive target for both sketches
    #[must_use]
    pub fn error_rate(mut self, rate: f64) -> Self {
        self.met_error_rate = rate;
        self.saved_error_rate = rate;
        self
    }

    #[must_use]
    pub fn met_error_rate(mut self, rate: f64) -> Self {
        self.met_error_rate = rate;
        self
    }

    #[must_use]
    pub fn saved_error_rate(mut self, rate: f64) -> Self {
        self.saved_error_rate = rate;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn keep_query(mut self, keep: bool) -> Self {
        self.keep_query = keep;
        self
    }

    #[must_use]
    pub fn max_insert_ratio(mut self, ratio: f64) -> Self {
        self.max_insert_ratio = ratio;
        self
    }

    #[must_use]
    pub fn shed_threshold(mut self, threshold: f64) -> Self {
        self.shed_threshold = threshold;
        self
    }

    #[must_use]
    pub fn shed_keep_probability(mut self, probability: f64) -> Self {
        self.shed_keep_probability = probability;
        self
    }

    #[must_use]
    pub fn tick_interval_secs(mut self, secs: u64) -> Self {
        self.tick_interval_secs = secs;
        self
    }

    /// Glob patterns (`*` wildcard) for discovered links that are never queued
    #[must_use]
    pub fn excluded_patterns(mut self, patterns: Vec<String>) -> Self {
        self.excluded_patterns = Some(patterns);
        self
    }
}

fn positive(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

fn unit_interval(field: &'static str, value: f64, open_low: bool) -> Result<(), ConfigError> {
    let ok = if open_low {
        value > 0.0 && value < 1.0
    } else {
        (0.0..=1.0).contains(&value)
    };
    if !ok {
        return Err(ConfigError::InvalidValue {
            field,
            reason: format!("{value} is outside the allowed range"),
        });
    }
    Ok(())
}

impl CrawlConfig {
    /// Check ranges and compile excluded patterns
    ///
    /// Also used after deserializing a persisted config, since compiled
    /// patterns are not serialized.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub(crate) fn validated(mut self) -> Result<Self, ConfigError> {
        positive("max_workers", self.max_workers)?;
        positive("max_queue_size", self.max_queue_size)?;
        positive("met_capacity", self.met_capacity)?;
        positive("saved_capacity", self.saved_capacity)?;
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch_timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        if self.filter_profile.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "filter_profile",
                reason: "must not be empty".to_string(),
            });
        }
        unit_interval("met_error_rate", self.met_error_rate, true)?;
        unit_interval("saved_error_rate", self.saved_error_rate, true)?;
        unit_interval("max_insert_ratio", self.max_insert_ratio, false)?;
        unit_interval("shed_threshold", self.shed_threshold, false)?;
        unit_interval("shed_keep_probability", self.shed_keep_probability, false)?;

        self.excluded_patterns_compiled = match &self.excluded_patterns {
            Some(patterns) => patterns
                .iter()
                .map(|p| compile_glob_pattern(p))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(self)
    }
}

// Build method only available when all required fields are set
impl CrawlConfigBuilder<WithFilterProfile> {
    /// Validate and produce the config
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for non-positive sizes or rates
    /// outside their range, and `ConfigError::InvalidPattern` for a bad glob.
    pub fn build(self) -> Result<CrawlConfig, ConfigError> {
        CrawlConfig {
            storage_dir: self.storage_dir.unwrap_or_default(),
            filter_profile: self.filter_profile.unwrap_or_default(),
            max_workers: self.max_workers,
            interval_ms: self.interval_ms,
            max_queue_size: self.max_queue_size,
            met_capacity: self.met_capacity,
            met_error_rate: self.met_error_rate,
            saved_capacity: self.saved_capacity,
            saved_error_rate: self.saved_error_rate,
            user_agent: self.user_agent,
            fetch_timeout_secs: self.fetch_timeout_secs,
            keep_query: self.keep_query,
            max_insert_ratio: self.max_insert_ratio,
            shed_threshold: self.shed_threshold,
            shed_keep_probability: self.shed_keep_probability,
            tick_interval_secs: self.tick_interval_secs,
            excluded_patterns: self.excluded_patterns,
            excluded_patterns_compiled: Vec::new(),
        }
        .validated()
    }
}
