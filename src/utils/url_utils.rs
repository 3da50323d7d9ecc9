//! URL canonicalization and validation.
//!
//! Every URL that reaches a sketch or the frontier goes through
//! [`canonical_url`] first, so two spellings of the same page collapse to one key.

use url::{Position, Url};

/// Host of the dongqiudi article site
pub const DQD_HOST: &str = "www.dongqiudi.com";

/// Check if a URL is an absolute http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // Skip data URLs, javascript URLs, and other non-http schemes
    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some(),
        Err(_) => false,
    }
}

/// `/articles/{id}` on dongqiudi, with or without the `.html` suffix
#[must_use]
pub fn is_dqd_article_path(host: &str, path: &str) -> bool {
    host == DQD_HOST && path.starts_with("/articles/") && path.split('/').count() == 3
}

/// Reduce a URL to the key used for deduplication
///
/// - fragment removed
/// - query removed unless `keep_query`
/// - scheme and host lowercased
/// - one trailing `/` removed from the path
/// - bare dongqiudi article paths get their `.html` suffix
///
/// Returns `None` if the input does not parse as an absolute URL.
#[must_use]
pub fn canonical_url(raw: &str, keep_query: bool) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    url.set_fragment(None);
    if !keep_query {
        url.set_query(None);
    }

    let mut path = url.path().to_string();
    if path.ends_with('/') {
        path.pop();
    }
    if let Some(host) = url.host_str()
        && is_dqd_article_path(host, &path)
        && !path.ends_with(".html")
    {
        path.push_str(".html");
    }

    Some(format!(
        "{}{}{}",
        &url[..Position::BeforePath],
        path,
        &url[Position::AfterPath..]
    ))
}
