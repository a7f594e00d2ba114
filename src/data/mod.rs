//! Core data models for the news reader
//!
//! This module contains the article types returned by the news API, the
//! identity rule used for every set-membership check, and the API client.

pub mod news_api;
pub mod tags;

pub use news_api::{
    Endpoint, FeedKind, FetchError, HeadlinesParams, NewsApiClient, NewsRequest, NewsResponse,
    NewsTransport, SearchParams,
};
pub use tags::{display_name, infer_tag, infer_tags, TAG_VOCABULARY};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identity used when an article has neither an id nor a url
const UNKNOWN_ARTICLE: &str = "unknown_article";

/// Publisher of an article
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A news article as returned by the API
///
/// Only `url` and `title` are always present; everything else is optional and
/// passed through untouched so stored records keep the full payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_to_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl Article {
    /// Creates an article with just a url and title
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Identity of the article: `id` when present, otherwise `url`
    pub fn identity(&self) -> ArticleId {
        let id = self
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| Some(self.url.as_str()).filter(|url| !url.is_empty()))
            .unwrap_or(UNKNOWN_ARTICLE);
        ArticleId(id.to_string())
    }

    /// Name of the publishing source, if known
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().and_then(|s| s.name.as_deref())
    }

    /// Publication time parsed from `publishedAt`
    pub fn published(&self) -> Option<DateTime<Utc>> {
        let raw = self.published_at.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Stable identity of an article for likes, saves and comments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(s: &str) -> Self {
        ArticleId(s.to_string())
    }
}

/// Deserializes a nullable string as an empty string
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
