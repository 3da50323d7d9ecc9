//! URL acceptance profiles
//!
//! A profile pairs a strict predicate (persist this page) with a loose one
//! (queue links like this), plus optional seed URLs.

pub mod profile;
pub mod sports;

pub use profile::{FilterProfile, FilterRegistry, UrlFilter};
