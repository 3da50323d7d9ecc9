//! URL predicates for the built-in sports-news profiles

use url::Url;

use crate::utils::url_utils::{DQD_HOST, is_dqd_article_path};

pub const SINA_SPORTS_HOST: &str = "sports.sina.com.cn";
pub const ZHIBO8_NEWS_HOST: &str = "news.zhibo8.com";

const ZHIBO8_SEEDS: [&str; 8] = [
    "https://news.zhibo8.com/zuqiu/more.htm?label=中超",
    "https://news.zhibo8.com/zuqiu/more.htm?label=英超",
    "https://news.zhibo8.com/zuqiu/more.htm?label=法甲",
    "https://news.zhibo8.com/zuqiu/more.htm?label=西甲",
    "https://news.zhibo8.com/zuqiu/more.htm?label=意甲",
    "https://news.zhibo8.com/zuqiu/more.htm?label=德甲",
    "https://news.zhibo8.com/zuqiu/more.htm?label=欧冠",
    "https://news.zhibo8.com/zuqiu/more.htm",
];

fn host_and_path(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_string();
    Some((host, parsed.path().to_string()))
}

#[must_use]
pub fn is_sina_sports_domain(url: &str) -> bool {
    host_and_path(url).is_some_and(|(host, _)| host == SINA_SPORTS_HOST)
}

/// `/china/<date>/doc-*.shtml` or `/{global,g}/<region>/<date>/doc-*.shtml`
#[must_use]
pub fn is_sina_football_article(url: &str) -> bool {
    let Some((host, path)) = host_and_path(url) else {
        return false;
    };
    if host != SINA_SPORTS_HOST || !path.ends_with(".shtml") {
        return false;
    }
    let parts: Vec<&str> = path.split('/').collect();
    let expected = match parts.get(1).copied() {
        Some("china") => 4,
        Some("global" | "g") => 5,
        _ => return false,
    };
    parts.len() == expected && parts.last().is_some_and(|leaf| leaf.starts_with("doc-"))
}

/// Anything under `news.zhibo8.com/zuqiu`
#[must_use]
pub fn is_zhibo8_football_section(url: &str) -> bool {
    host_and_path(url).is_some_and(|(host, path)| host == ZHIBO8_NEWS_HOST && path.starts_with("/zuqiu"))
}

/// `news.zhibo8.com/zuqiu/<yyyy-mm-dd>/<id>native.htm`
#[must_use]
pub fn is_zhibo8_football_article(url: &str) -> bool {
    let Some((host, path)) = host_and_path(url) else {
        return false;
    };
    if host != ZHIBO8_NEWS_HOST || !path.starts_with("/zuqiu/") {
        return false;
    }
    let parts: Vec<&str> = path.split('/').collect();
    parts.len() == 4 && parts[3].ends_with("native.htm")
}

#[must_use]
pub fn is_dqd_domain(url: &str) -> bool {
    host_and_path(url).is_some_and(|(host, _)| host == DQD_HOST)
}

#[must_use]
pub fn is_dqd_article(url: &str) -> bool {
    host_and_path(url).is_some_and(|(host, path)| is_dqd_article_path(&host, &path))
}

/// zhibo8 league index pages, percent-encoded the way they are requested
#[must_use]
pub fn zhibo8_seeds() -> Vec<String> {
    ZHIBO8_SEEDS
        .iter()
        .filter_map(|raw| Url::parse(raw).ok())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sina_articles() {
        assert!(is_sina_football_article(
            "https://sports.sina.com.cn/global/france/2024-01-10/doc-inaayyri7443394.shtml"
        ));
        assert!(is_sina_football_article(
            "https://sports.sina.com.cn/china/2024-01-10/doc-inaayyri7443394.shtml"
        ));
        assert!(!is_sina_football_article("https://sports.sina.com.cn/global/france"));
        assert!(!is_sina_football_article(
            "https://sports.sina.com.cn/nba/2024-01-10/doc-inaayyri7443394.shtml"
        ));
        assert!(is_sina_sports_domain("https://sports.sina.com.cn/global"));
    }

    #[test]
    fn zhibo8_articles() {
        assert!(is_zhibo8_football_article(
            "https://news.zhibo8.com/zuqiu/2024-01-10/659e6cf2909d6native.htm"
        ));
        assert!(!is_zhibo8_football_article("https://news.zhibo8.com/zuqiu/more.htm"));
        assert!(is_zhibo8_football_section("https://news.zhibo8.com/zuqiu/more.htm"));
        assert!(!is_zhibo8_football_section("https://news.zhibo8.com/nba/more.htm"));
    }

    #[test]
    fn zhibo8_seeds_are_percent_encoded() {
        let seeds = zhibo8_seeds();
        assert_eq!(seeds.len(), 8);
        assert_eq!(
            seeds[0],
            "https://news.zhibo8.com/zuqiu/more.htm?label=%E4%B8%AD%E8%B6%85"
        );
        assert!(seeds.iter().all(|s| s.is_ascii()));
    }

    #[test]
    fn dqd_articles() {
        assert!(is_dqd_article("https://www.dongqiudi.com/articles/3823012.html"));
        assert!(is_dqd_article("https://www.dongqiudi.com/articles/3823012"));
        assert!(!is_dqd_article("https://www.dongqiudi.com/news"));
        assert!(is_dqd_domain("https://www.dongqiudi.com/news"));
    }
}
