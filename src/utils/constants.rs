//! Shared configuration constants for snapcrawl
//!
//! Default values used by the config builder and the crawl engine so the
//! numbers live in one place.

/// Default worker count
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Default per-URL delay in milliseconds
///
/// Every worker sleeps `uniform(0.8, 1.2) * interval` after each processed
/// URL, so with 4 workers the aggregate rate is roughly 1.3 requests per second.
pub const DEFAULT_INTERVAL_MS: u64 = 3000;

/// Default frontier capacity
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;

/// Default capacity of the seen-URL sketch
pub const DEFAULT_MET_CAPACITY: usize = 100_000;

/// Default capacity of the saved-URL sketch
pub const DEFAULT_SAVED_CAPACITY: usize = 100_000;

/// Default sketch false-positive target
pub const DEFAULT_ERROR_RATE: f64 = 1e-5;

/// Default fetch timeout in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 5;

/// Fraction of frontier capacity one page may enqueue
pub const DEFAULT_MAX_INSERT_RATIO: f64 = 0.1;

/// Fill ratio above which dequeued non-strict URLs are shed
pub const DEFAULT_SHED_THRESHOLD: f64 = 0.5;

/// Probability that a shed candidate is kept anyway
pub const DEFAULT_SHED_KEEP_PROBABILITY: f64 = 0.25;

/// Seconds between progress ticks while an epoch runs
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 5;

/// Frontier poll timeout; bounds how long a worker can miss the stop signal
pub const DEQUEUE_TIMEOUT_MS: u64 = 1000;

/// Title recorded when a page has no usable `<title>`
pub const UNTITLED: &str = "Untitled";

/// Desktop Safari user agent
pub const SAFARI_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1.2 Safari/605.1.15";
