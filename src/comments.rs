//! Article comments
//!
//! Comments are kept per article under `comments_<articleId>` and mirrored in
//! a global list used for the dashboard count. Input is validated before
//! anything is written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::clock::Clock;
use crate::data::ArticleId;
use crate::storage::{keys, Storage, StorageError};

/// Longest accepted comment, in characters
pub const MAX_COMMENT_CHARS: usize = 250;
/// Name shown on comments posted by the current user
pub const DEFAULT_USERNAME: &str = "TEAM15";

/// Errors that can occur when posting a comment
#[derive(Debug, Error)]
pub enum CommentError {
    #[error("Comment cannot be empty.")]
    Empty,

    #[error("Comment cannot be more than 250 characters.")]
    TooLong,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A posted comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Creation time in epoch milliseconds, unique across all comments
    pub id: i64,
    pub username: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

/// Trims `input` and checks it can be posted
pub fn validate_comment(input: &str) -> Result<&str, CommentError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CommentError::Empty);
    }
    if trimmed.chars().count() > MAX_COMMENT_CHARS {
        return Err(CommentError::TooLong);
    }
    Ok(trimmed)
}

/// Warning shown while typing once the limit is reached
pub fn input_hint(input: &str) -> Option<&'static str> {
    if input.trim().chars().count() >= MAX_COMMENT_CHARS {
        Some("You have reached the maximum of 250 characters.")
    } else {
        None
    }
}

/// Input pre-filled when replying to `username`
pub fn reply_prefix(username: &str) -> String {
    format!("@{} ", username)
}

/// Age of `then` as "Just Now", "1 Second Ago", "5 Minutes Ago", ...
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds <= 0 {
        return "Just Now".to_string();
    }

    let (value, unit) = if seconds < 60 {
        (seconds, "Second")
    } else if seconds < 3600 {
        (seconds / 60, "Minute")
    } else if seconds < 86_400 {
        (seconds / 3600, "Hour")
    } else {
        (seconds / 86_400, "Day")
    };
    let plural = if value == 1 { "" } else { "s" };
    format!("{} {}{} Ago", value, unit, plural)
}

/// Reads and writes comments
#[derive(Clone)]
pub struct CommentStore {
    storage: Storage,
    clock: Arc<dyn Clock>,
    username: String,
}

impl CommentStore {
    pub fn new(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            username: DEFAULT_USERNAME.to_string(),
        }
    }

    /// Post comments under another name
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Comments of one article, oldest first
    pub fn comments(&self, article: &ArticleId) -> Vec<Comment> {
        self.storage.load_or_default(&keys::comments(article.as_str()))
    }

    /// Every comment on every article
    pub fn all(&self) -> Vec<Comment> {
        self.storage.load_or_default(keys::ALL_COMMENTS)
    }

    /// Validates and appends a comment to the article and the global list
    pub fn post(&self, article: &ArticleId, input: &str) -> Result<Comment, CommentError> {
        let text = validate_comment(input)?;
        let mut all = self.all();
        let mut comments = self.comments(article);

        let now = self.clock.now();
        let newest = all.iter().map(|c| c.id).max().unwrap_or(i64::MIN);
        let comment = Comment {
            id: now.timestamp_millis().max(newest.saturating_add(1)),
            username: self.username.clone(),
            timestamp: now,
            text: text.to_string(),
        };

        comments.push(comment.clone());
        all.push(comment.clone());
        self.storage.store(&keys::comments(article.as_str()), &comments)?;
        self.storage.store(keys::ALL_COMMENTS, &all)?;

        debug!(article = %article, id = comment.id, "Posted comment");
        Ok(comment)
    }

    /// Removes a comment from the article and the global list
    ///
    /// Returns whether the article held the comment.
    pub fn delete(&self, article: &ArticleId, comment_id: i64) -> Result<bool, StorageError> {
        let mut comments = self.comments(article);
        let before = comments.len();
        comments.retain(|c| c.id != comment_id);
        let removed = comments.len() != before;

        let mut all = self.all();
        all.retain(|c| c.id != comment_id);

        self.storage.store(&keys::comments(article.as_str()), &comments)?;
        self.storage.store(keys::ALL_COMMENTS, &all)?;
        Ok(removed)
    }
}
