//! HTTP fetcher backed by `reqwest`

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::config::CrawlConfig;
use crate::crawl_engine::{FetchError, Fetcher};

/// One GET per call; the whole request, body included, is bounded by `timeout`
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

fn classify(err: &reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Transport(err.to_string())
    }
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns `FetchError::Transport` if the HTTP client cannot be built.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client, timeout })
    }

    /// # Errors
    ///
    /// See [`HttpFetcher::new`].
    pub fn from_config(config: &CrawlConfig) -> Result<Self, FetchError> {
        Self::new(config.user_agent(), config.fetch_timeout())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
        headers: &'a HashMap<String, String>,
    ) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        Box::pin(async move {
            let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;

            let mut request = self.client.get(parsed);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let work = async {
                let response = request.send().await.map_err(|e| classify(&e, self.timeout))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status(status.as_u16()));
                }
                let body = response.bytes().await.map_err(|e| classify(&e, self.timeout))?;
                Ok(body.to_vec())
            };

            tokio::time::timeout(self.timeout, work)
                .await
                .map_err(|_| FetchError::Timeout(self.timeout))?
        })
    }
}
