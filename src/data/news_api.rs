//! NewsAPI client
//!
//! This module describes the two endpoint families the reader uses, the
//! request parameters (which double as cache keys), the HTTP transport and the
//! mapping of failures to user-facing messages.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::Article;
use crate::storage::keys;

/// Base URL for the NewsAPI service
pub const NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";

pub const RATE_LIMIT_MESSAGE: &str =
    "You've reached the rate limit. Please wait a moment before trying again.";
pub const INVALID_KEY_MESSAGE: &str = "API key is invalid or expired.";
pub const NO_ARTICLES_MESSAGE: &str = "No articles found.";
pub const NO_SEARCH_RESULTS_MESSAGE: &str = "No articles found for your search criteria.";
pub const GENERIC_FETCH_MESSAGE: &str = "Could not fetch articles, please try again later.";

/// Connect timeout for the HTTP client
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when fetching articles
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API answered with a non-success status
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    /// HTTP request failed before a status was received
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API answered successfully but without articles
    #[error("No articles found")]
    NoArticles,
}

impl FetchError {
    /// HTTP status code, when the failure carried one
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the API rejected the request for exceeding its rate limit
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Message shown in place of the feed content
    pub fn user_message(&self, feed: FeedKind) -> String {
        match self {
            FetchError::Status { status: 429, .. } => RATE_LIMIT_MESSAGE.to_string(),
            FetchError::Status { status: 401, .. } => INVALID_KEY_MESSAGE.to_string(),
            FetchError::Status { status: 404, .. } => feed.not_found_message().to_string(),
            FetchError::Status { status, reason } => format!("Error: {} - {}", status, reason),
            FetchError::NoArticles => NO_ARTICLES_MESSAGE.to_string(),
            FetchError::Request(_) | FetchError::Parse(_) => GENERIC_FETCH_MESSAGE.to_string(),
        }
    }
}

/// Which feed a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// General top headlines
    Headlines,
    /// Articles for one topic tag
    Tagged,
    /// Articles recommended from liked topics
    Recommended,
}

impl FeedKind {
    /// Cache namespace prefix for this feed
    pub fn namespace(self) -> &'static str {
        match self {
            FeedKind::Headlines => keys::NEWS_CACHE_PREFIX,
            FeedKind::Tagged => keys::TAG_CACHE_PREFIX,
            FeedKind::Recommended => keys::RECOMMENDED_CACHE_PREFIX,
        }
    }

    /// Message shown when the API answers 404
    pub fn not_found_message(self) -> &'static str {
        match self {
            FeedKind::Headlines => NO_ARTICLES_MESSAGE,
            FeedKind::Tagged | FeedKind::Recommended => NO_SEARCH_RESULTS_MESSAGE,
        }
    }
}

/// Endpoint family of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    TopHeadlines,
    Everything,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::TopHeadlines => "top-headlines",
            Endpoint::Everything => "everything",
        }
    }
}

/// Query parameters of the top-headlines endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadlinesParams {
    pub country: String,
    pub page: u32,
    pub page_size: u32,
    pub q: String,
}

/// Query parameters of the everything (search) endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub page: u32,
    pub page_size: u32,
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
}

/// A request to one of the endpoints
///
/// Serializes to the bare query parameters, which is also the stable form
/// used to derive cache keys. The API key is never part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NewsRequest {
    TopHeadlines(HeadlinesParams),
    Everything(SearchParams),
}

impl NewsRequest {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            NewsRequest::TopHeadlines(_) => Endpoint::TopHeadlines,
            NewsRequest::Everything(_) => Endpoint::Everything,
        }
    }

    pub fn page_size(&self) -> u32 {
        match self {
            NewsRequest::TopHeadlines(p) => p.page_size,
            NewsRequest::Everything(p) => p.page_size,
        }
    }

    pub fn query(&self) -> &str {
        match self {
            NewsRequest::TopHeadlines(p) => &p.q,
            NewsRequest::Everything(p) => &p.q,
        }
    }
}

/// Response body shared by both endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default)]
    pub total_results: u64,
}

/// Anything that can answer a [`NewsRequest`]
#[async_trait]
pub trait NewsTransport: Send + Sync {
    async fn fetch(&self, request: &NewsRequest) -> Result<NewsResponse, FetchError>;
}

/// Client for fetching articles from NewsAPI
#[derive(Debug, Clone)]
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl NewsApiClient {
    /// Create a new client for the public API
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("pocketfeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: NEWS_API_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Point the client at another base URL (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full URL of an endpoint
    fn endpoint_url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint.path())
    }
}

#[async_trait]
impl NewsTransport for NewsApiClient {
    async fn fetch(&self, request: &NewsRequest) -> Result<NewsResponse, FetchError> {
        let url = self.endpoint_url(request.endpoint());
        info!(url = %url, q = request.query(), "Fetching articles");

        let mut builder = self.client.get(&url).query(request);
        if let Some(ref key) = self.api_key {
            builder = builder.header("X-Api-Key", key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let text = response.text().await?;
        let parsed: NewsResponse = serde_json::from_str(&text)?;
        debug!(
            articles = parsed.articles.len(),
            total = parsed.total_results,
            "Received articles"
        );
        Ok(parsed)
    }
}
