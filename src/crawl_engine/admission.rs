//! Probabilistic admission control for the frontier
//!
//! Two independent rules:
//!
//! * At dequeue time, when the frontier is above `shed_threshold` of
//!   capacity, a URL failing the strict filter is discarded unless a uniform
//!   draw is at most `shed_keep_probability`.
//! * At enqueue time, strict links are always attempted and loose-only
//!   links are admitted with probability `(len / capacity)^2`.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::filters::FilterProfile;

/// Source of uniform draws in `[0, 1)`
pub trait Sampler: Send + Sync {
    fn sample(&self) -> f64;
}

/// Thread-local RNG; the default
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSampler;

impl Sampler for ThreadSampler {
    fn sample(&self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Deterministic RNG for reproducible runs and statistical tests
#[derive(Debug)]
pub struct SeededSampler(Mutex<StdRng>);

impl SeededSampler {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }
}

impl Sampler for SeededSampler {
    fn sample(&self) -> f64 {
        self.0.lock().random::<f64>()
    }
}

/// Always returns the same value; `FixedSampler(0.0)` admits everything eligible
#[derive(Debug, Clone, Copy)]
pub struct FixedSampler(pub f64);

impl Sampler for FixedSampler {
    fn sample(&self) -> f64 {
        self.0
    }
}

/// How a discovered link relates to the active filter profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClass {
    Strict,
    Loose,
    Rejected,
}

impl LinkClass {
    #[must_use]
    pub fn of(profile: &FilterProfile, url: &str) -> Self {
        if profile.is_strict(url) {
            Self::Strict
        } else if profile.is_loose(url) {
            Self::Loose
        } else {
            Self::Rejected
        }
    }
}

/// Chance a loose-only link is admitted at the given fill level
#[must_use]
pub fn loose_admission_probability(len: usize, capacity: usize) -> f64 {
    if capacity == 0 {
        return 0.0;
    }
    let ratio = len as f64 / capacity as f64;
    ratio * ratio
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmissionPolicy {
    pub shed_threshold: f64,
    pub shed_keep_probability: f64,
}

impl AdmissionPolicy {
    #[must_use]
    pub fn from_config(config: &crate::config::CrawlConfig) -> Self {
        Self {
            shed_threshold: config.shed_threshold(),
            shed_keep_probability: config.shed_keep_probability(),
        }
    }

    /// Decide whether a freshly dequeued URL is discarded unprocessed
    #[must_use]
    pub fn should_shed(
        &self,
        len: usize,
        capacity: usize,
        passes_strict: bool,
        sampler: &dyn Sampler,
    ) -> bool {
        if passes_strict || (len as f64) <= self.shed_threshold * capacity as f64 {
            return false;
        }
        sampler.sample() > self.shed_keep_probability
    }

    /// Decide whether a discovered link should be pushed
    #[must_use]
    pub fn admit(&self, class: LinkClass, len: usize, capacity: usize, sampler: &dyn Sampler) -> bool {
        match class {
            LinkClass::Strict => true,
            LinkClass::Loose => sampler.sample() <= loose_admission_probability(len, capacity),
            LinkClass::Rejected => false,
        }
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            shed_threshold: crate::utils::DEFAULT_SHED_THRESHOLD,
            shed_keep_probability: crate::utils::DEFAULT_SHED_KEEP_PROBABILITY,
        }
    }
}
