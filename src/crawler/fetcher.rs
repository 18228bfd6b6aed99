//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the search page URL for a page number
//! - One cached HTTP client per proxy, with browser-like headers
//! - Bounded per-request timeouts
//! - Classifying transport failures

use crate::config::TargetConfig;
use crate::{ConfigError, HarvestError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Proxy};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a single fetch attempt produced no usable body
///
/// All of these are retryable from the worker's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("non-success status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("invalid proxy: {0}")]
    Proxy(String),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl FetchError {
    /// True for the failures a flaky proxy produces routinely
    ///
    /// Anything else is worth a warning in the logs.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Connect(_) | Self::Status(_) | Self::Body(_)
        )
    }
}

/// Fetches one search page through one proxy
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues a GET for `url` through `proxy` and returns the body of a 2xx
    /// response
    async fn fetch(&self, url: &Url, proxy: &str) -> Result<String, FetchError>;
}

/// Builds the search URL for a page number
///
/// # Example
///
/// ```
/// use yp_harvest::config::TargetConfig;
/// use yp_harvest::crawler::page_url;
///
/// let url = page_url(&TargetConfig::default(), 3).unwrap();
/// assert!(url.as_str().ends_with("pageNumber=3"));
/// ```
pub fn page_url(target: &TargetConfig, page: u64) -> Result<Url, url::ParseError> {
    let page = page.to_string();
    Url::parse_with_params(
        &target.base_url,
        &[
            ("referredBy", target.referred_by.as_str()),
            ("clue", target.query.as_str()),
            ("locationClue", target.location.as_str()),
            ("pageNumber", page.as_str()),
        ],
    )
}

/// reqwest-backed fetcher
///
/// reqwest binds proxies to the client, so one client is built per proxy on
/// first use and reused for every later request through that proxy. The
/// proxy applies to both http and https targets.
pub struct HttpFetcher {
    headers: HeaderMap,
    timeout: Duration,
    clients: Mutex<HashMap<String, Client>>,
}

impl HttpFetcher {
    /// Creates a fetcher that sends the target's User-Agent and gives up on
    /// a request after `timeout`
    pub fn new(target: &TargetConfig, timeout: Duration) -> Result<Self, HarvestError> {
        let user_agent = HeaderValue::from_str(&target.user_agent).map_err(|e| {
            ConfigError::Validation(format!("Invalid user_agent header: {}", e))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, user_agent);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert("DNT", HeaderValue::from_static("1"));
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));

        Ok(Self {
            headers,
            timeout,
            clients: Mutex::new(HashMap::new()),
        })
    }

    fn client_for(&self, proxy: &str) -> Result<Client, FetchError> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|e| FetchError::Unexpected(format!("client cache poisoned: {}", e)))?;

        if let Some(client) = clients.get(proxy) {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .proxy(Proxy::all(proxy).map_err(|e| FetchError::Proxy(e.to_string()))?)
            .default_headers(self.headers.clone())
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| FetchError::Unexpected(e.to_string()))?;

        clients.insert(proxy.to_string(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, proxy: &str) -> Result<String, FetchError> {
        let client = self.client_for(proxy)?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Got non-success status {} for {}", status, url);
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })
    }
}

/// Maps a reqwest send error onto the fetch taxonomy
fn classify_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() || e.is_request() {
        // TLS and proxy handshake failures surface as connect/request errors
        FetchError::Connect(e.to_string())
    } else if e.is_builder() {
        FetchError::Proxy(e.to_string())
    } else {
        FetchError::Unexpected(e.to_string())
    }
}
