use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::convert::validate;
use crate::error::{FetchError, Result};

/// Anything that can produce one XML document per call.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// The resolved URL readings are attributed to.
    fn source_url(&self) -> &str;

    /// Fetch the document once. No internal retries.
    async fn fetch(&self) -> Result<String>;
}

/// Options for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(meteo_core::config::DEFAULT_TIMEOUT_SECS),
            user_agent: meteo_core::config::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Bounded HTTP GET of an XML document with gzip/deflate decoding.
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpFetcher {
    /// `url` is used as given; normalize it first with
    /// [`crate::normalize_source_url`].
    pub fn new(url: impl Into<String>, options: FetchOptions) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(options.user_agent)
            .timeout(options.timeout)
            .gzip(true)
            .deflate(true)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            timeout: options.timeout,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                secs: self.timeout.as_secs(),
            }
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl FeedSource for HttpFetcher {
    fn source_url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<String> {
        debug!(url = %self.url, "fetching feed");

        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(url = %self.url, status = status.as_u16(), "feed returned error status");
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        if body.trim().is_empty() {
            return Err(FetchError::Empty);
        }

        // Validation only; the converter parses again.
        validate(&body)?;

        debug!(url = %self.url, bytes = body.len(), "feed fetched");
        Ok(body)
    }
}
