//! Configuration module for the crawl engine
//!
//! This module provides the `CrawlConfig` struct and its type-safe builder
//! with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod errors;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{CrawlConfigBuilder, WithFilterProfile, WithStorageDir};
pub use errors::ConfigError;
pub use types::CrawlConfig;
