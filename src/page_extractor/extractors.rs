//! HTML link and title extraction with `scraper`

use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use crate::crawl_engine::LinkExtractor;

static ANCHOR_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse("a[href]").ok());
static TITLE_SELECTOR: LazyLock<Option<Selector>> =
    LazyLock::new(|| Selector::parse("title").ok());

/// Extract all HTTP/HTTPS links from HTML.
///
/// Only `<a href>` is considered. Relative references are resolved against
/// `base_url`; results without a host are dropped.
#[must_use]
pub fn extract_links_from_html(html: &str, base_url: &str) -> HashSet<String> {
    let mut links = HashSet::new();

    let Ok(base) = Url::parse(base_url) else {
        return links;
    };
    let Some(selector) = ANCHOR_SELECTOR.as_ref() else {
        return links;
    };

    let document = Html::parse_document(html);
    for element in document.select(selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        // Skip empty, javascript:, mailto:, tel:, and fragment-only links
        let href = href.trim();
        if href.is_empty()
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
            || href.starts_with('#')
        {
            continue;
        }

        if let Ok(resolved) = base.join(href)
            && matches!(resolved.scheme(), "http" | "https")
            && resolved.host_str().is_some_and(|h| !h.is_empty())
        {
            links.insert(resolved.to_string());
        }
    }

    links
}

/// Trimmed text of the first `<title>`, if non-empty
#[must_use]
pub fn extract_title(html: &str) -> Option<String> {
    let selector = TITLE_SELECTOR.as_ref()?;
    let document = Html::parse_document(html);
    let title = document
        .select(selector)
        .next()?
        .text()
        .collect::<String>();
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    (!title.is_empty()).then_some(title)
}

/// `LinkExtractor` over HTML pages; non-UTF-8 bytes are decoded lossily
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract_links(&self, content: &[u8], base_url: &str) -> HashSet<String> {
        extract_links_from_html(&String::from_utf8_lossy(content), base_url)
    }

    fn extract_title(&self, content: &[u8]) -> Option<String> {
        extract_title(&String::from_utf8_lossy(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<html><head><title>
        Match  report </title></head><body>
        <a href="/global/a.shtml">a</a>
        <a href="https://other.example/b#frag">b</a>
        <a href="c/d">c</a>
        <a href="mailto:x@y.z">mail</a>
        <a href="#top">top</a>
        <a href="javascript:void(0)">js</a>
        <a href="ftp://files.example/x">ftp</a>
        <a href="/global/a.shtml">dup</a>
    </body></html>"##;

    #[test]
    fn resolves_and_filters_links() {
        let links = extract_links_from_html(PAGE, "https://sports.sina.com.cn/global/index.html");
        let expected: HashSet<String> = [
            "https://sports.sina.com.cn/global/a.shtml",
            "https://other.example/b#frag",
            "https://sports.sina.com.cn/global/c/d",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(links, expected);
    }

    #[test]
    fn bad_base_yields_nothing() {
        assert!(extract_links_from_html(PAGE, "not a url").is_empty());
    }

    #[test]
    fn title_is_whitespace_normalized() {
        assert_eq!(extract_title(PAGE).as_deref(), Some("Match report"));
        assert_eq!(extract_title("<html><body>x</body></html>"), None);
    }
}
