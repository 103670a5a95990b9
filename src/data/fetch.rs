//! Remote row fetching
//!
//! The loader talks to a [`RowFetcher`] so hosts and tests can replace
//! the network. [`HttpRowFetcher`] is the reqwest-backed default.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

/// Why a fetch produced no JSON
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Parse(String),
}

/// Source of remote row JSON
#[async_trait]
pub trait RowFetcher: Send + Sync {
    /// Fetch `url` and parse the body as JSON
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// Returns `true` for absolute `http`/`https` URLs with a host and no
/// embedded credentials.
#[must_use]
pub fn is_safe_absolute_url(candidate: &str) -> bool {
    let trimmed = candidate.trim();
    if trimmed.is_empty() || trimmed != candidate {
        return false;
    }
    let Ok(url) = Url::parse(candidate) else {
        return false;
    };

    matches!(url.scheme(), "http" | "https")
        && url.host_str().is_some_and(|h| !h.is_empty())
        && url.username().is_empty()
        && url.password().is_none()
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpRowFetcher {
    client: Client,
}

impl HttpRowFetcher {
    /// Create a fetcher with default timeouts
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing client
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RowFetcher for HttpRowFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        debug!("Fetching row data");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        info!(status = %status, "Response received");
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }
}
