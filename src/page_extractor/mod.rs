//! Adapters for the engine's external seams: HTTP fetching and HTML link extraction

pub mod extractors;
pub mod fetcher;

pub use extractors::{HtmlLinkExtractor, extract_links_from_html, extract_title};
pub use fetcher::HttpFetcher;
