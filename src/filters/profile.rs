//! Filter profiles and the registry that resolves them by name

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::sports;
use crate::config::ConfigError;

/// Predicate over a canonical URL string
pub type UrlFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Named pair of acceptance predicates plus seed URLs
///
/// `strict` decides whether content is persisted; `loose` decides whether a
/// discovered link is worth queueing. `loose` is expected to accept
/// everything `strict` accepts.
#[derive(Clone)]
pub struct FilterProfile {
    name: String,
    strict: UrlFilter,
    loose: UrlFilter,
    seeds: Vec<String>,
    bypass: HashSet<String>,
}

impl fmt::Debug for FilterProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterProfile")
            .field("name", &self.name)
            .field("seeds", &self.seeds.len())
            .field("bypass", &self.bypass.len())
            .finish_non_exhaustive()
    }
}

impl FilterProfile {
    pub fn new(
        name: impl Into<String>,
        strict: impl Fn(&str) -> bool + Send + Sync + 'static,
        loose: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            strict: Arc::new(strict),
            loose: Arc::new(loose),
            seeds: Vec::new(),
            bypass: HashSet::new(),
        }
    }

    /// Seed URLs used by `CrawlEngine::reseed_random`
    ///
    /// With `bypass_seen`, these URLs skip the seen check when dequeued so
    /// index pages can be revisited every epoch. They are never discovered
    /// automatically; only explicit seeding puts them back in the frontier.
    #[must_use]
    pub fn with_seeds(mut self, seeds: Vec<String>, bypass_seen: bool) -> Self {
        if bypass_seen {
            self.bypass = seeds.iter().cloned().collect();
        }
        self.seeds = seeds;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_strict(&self, url: &str) -> bool {
        (self.strict)(url)
    }

    #[must_use]
    pub fn is_loose(&self, url: &str) -> bool {
        (self.loose)(url)
    }

    #[must_use]
    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    #[must_use]
    pub fn bypasses_seen(&self, url: &str) -> bool {
        self.bypass.contains(url)
    }
}

/// Explicit name-to-profile table, resolved once when an engine is built
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    profiles: HashMap<String, FilterProfile>,
}

impl FilterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `sina`, `zhibo8` and `dongqiudi` profiles
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(FilterProfile::new(
            "sina",
            sports::is_sina_football_article,
            sports::is_sina_sports_domain,
        ));
        registry.register(
            FilterProfile::new(
                "zhibo8",
                sports::is_zhibo8_football_article,
                sports::is_zhibo8_football_section,
            )
            .with_seeds(sports::zhibo8_seeds(), true),
        );
        registry.register(FilterProfile::new(
            "dongqiudi",
            sports::is_dqd_article,
            sports::is_dqd_domain,
        ));
        registry
    }

    /// Add or replace a profile
    pub fn register(&mut self, profile: FilterProfile) -> &mut Self {
        self.profiles.insert(profile.name.clone(), profile);
        self
    }

    /// Look up a profile by name
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownFilterProfile` when no profile has that name.
    pub fn resolve(&self, name: &str) -> Result<FilterProfile, ConfigError> {
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownFilterProfile(name.to_string()))
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_resolve() {
        let registry = FilterRegistry::builtin();
        assert_eq!(registry.names(), vec!["dongqiudi", "sina", "zhibo8"]);

        let zhibo8 = registry.resolve("zhibo8").unwrap();
        assert_eq!(zhibo8.seeds().len(), 8);
        assert!(zhibo8.bypasses_seen(&zhibo8.seeds()[0]));

        let sina = registry.resolve("sina").unwrap();
        assert!(sina.seeds().is_empty());
    }

    #[test]
    fn unknown_profile_is_a_config_error() {
        let err = FilterRegistry::builtin().resolve("espn").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownFilterProfile(name) if name == "espn"));
    }

    #[test]
    fn loose_contains_strict_for_builtins() {
        let registry = FilterRegistry::builtin();
        let cases = [
            ("sina", "https://sports.sina.com.cn/china/2024-01-10/doc-abc.shtml"),
            ("zhibo8", "https://news.zhibo8.com/zuqiu/2024-01-10/abcnative.htm"),
            ("dongqiudi", "https://www.dongqiudi.com/articles/1.html"),
        ];
        for (name, url) in cases {
            let profile = registry.resolve(name).unwrap();
            assert!(profile.is_strict(url), "{name} strict should accept {url}");
            assert!(profile.is_loose(url), "{name} loose should accept {url}");
        }
    }
}
