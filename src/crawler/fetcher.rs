//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler and the indexer:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests with bounded retry and exponential backoff
//! - Redirect limiting
//! - Error classification into retryable and permanent failures
//!
//! `fetch_html` is the shared primitive. `fetch_links` and `fetch_text` wrap
//! it for the two orchestrators and never fail: errors are logged and an
//! empty result is returned.

use crate::config::HttpConfig;
use crate::crawler::parser::{extract_external_links, extract_text};
use crate::crawler::retry::{Attempt, RetryPolicy};
use reqwest::{redirect::Policy, Client};
use thiserror::Error;
use url::Url;

/// Maximum number of redirects followed for one request
pub const MAX_REDIRECTS: usize = 10;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Too many redirects for {url}")]
    RedirectLimit { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    /// Classifies a reqwest error for the given URL
    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if err.is_redirect() {
            Self::RedirectLimit {
                url: url.to_string(),
            }
        } else {
            Self::Transport {
                url: url.to_string(),
                source: err,
            }
        }
    }

    /// Returns true if another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Status { status, .. } => RetryPolicy::is_retryable_status(*status),
            Self::RedirectLimit { .. } | Self::InvalidUrl { .. } => false,
        }
    }
}

/// Links discovered on one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBatch {
    /// The URL that was fetched
    pub source: String,

    /// Canonical external links, deduplicated
    pub links: Vec<String>,
}

impl LinkBatch {
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            links: Vec::new(),
        }
    }
}

/// Builds an HTTP client with the configured user agent and timeout
///
/// # Example
///
/// ```no_run
/// use trawl::config::HttpConfig;
/// use trawl::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with retry
///
/// Cloning is cheap; every fetch worker gets its own clone sharing the same
/// connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
}

impl Fetcher {
    /// Creates a fetcher with the default retry policy
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetches the body of `url` as text
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Body returned |
    /// | HTTP 429, 500, 502, 503, 504 | Retried |
    /// | Other HTTP status | Immediate error |
    /// | Timeout or transport failure | Retried |
    /// | More than 10 redirects | Immediate error |
    pub async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        self.retry
            .run_with_retry(|_| self.attempt(parsed.clone(), url))
            .await
    }

    async fn attempt(&self, target: Url, url: &str) -> Attempt<String, FetchError> {
        let response = match self.client.get(target).send().await {
            Ok(response) => response,
            Err(e) => return classify(FetchError::from_reqwest(url, e)),
        };

        let status = response.status();
        if !status.is_success() {
            return classify(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        match response.text().await {
            Ok(body) => Attempt::Done(body),
            Err(e) => classify(FetchError::from_reqwest(url, e)),
        }
    }

    /// Fetches `url` and extracts its external links
    ///
    /// Any failure yields an empty batch for the same source URL.
    pub async fn fetch_links(&self, url: &str) -> LinkBatch {
        let base = match Url::parse(url) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("Cannot fetch {}: {}", url, e);
                return LinkBatch::empty(url);
            }
        };

        match self.fetch_html(url).await {
            Ok(html) => LinkBatch {
                source: url.to_string(),
                links: extract_external_links(&html, &base),
            },
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                LinkBatch::empty(url)
            }
        }
    }

    /// Fetches `url` and extracts its visible text
    ///
    /// Any failure yields an empty string.
    pub async fn fetch_text(&self, url: &str) -> String {
        match self.fetch_html(url).await {
            Ok(html) => extract_text(&html),
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                String::new()
            }
        }
    }
}

fn classify(err: FetchError) -> Attempt<String, FetchError> {
    if err.is_retryable() {
        Attempt::Retry(err)
    } else {
        Attempt::Abort(err)
    }
}
