//! Recent activity and engagement counters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::storage::{keys, Storage, StorageError};

/// Number of events kept in the activity log
pub const MAX_RECENT_ACTIONS: usize = 20;

/// Kind of a logged user action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Like,
    Dislike,
    Save,
    Comment,
    Share,
}

impl ActivityKind {
    /// Past-tense verb for activity lines ("Liked", "Shared", ...)
    pub fn verb(self) -> &'static str {
        match self {
            ActivityKind::Like => "Liked",
            ActivityKind::Dislike => "Disliked",
            ActivityKind::Save => "Saved",
            ActivityKind::Comment => "Commented on",
            ActivityKind::Share => "Shared",
        }
    }
}

/// One entry of the activity log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub article_title: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Bounded log of the latest user actions
#[derive(Clone)]
pub struct ActivityLog {
    storage: Storage,
    clock: Arc<dyn Clock>,
}

impl ActivityLog {
    pub fn new(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Appends an event, dropping the oldest beyond [`MAX_RECENT_ACTIONS`]
    pub fn record(
        &self,
        kind: ActivityKind,
        article_title: &str,
        tag: Option<&str>,
    ) -> Result<ActivityEvent, StorageError> {
        let event = ActivityEvent {
            kind,
            article_title: article_title.to_string(),
            timestamp: self.clock.now(),
            tag: tag.map(str::to_string),
        };

        let mut events = self.events();
        events.push(event.clone());
        if events.len() > MAX_RECENT_ACTIONS {
            let excess = events.len() - MAX_RECENT_ACTIONS;
            events.drain(..excess);
        }
        self.storage.store(keys::RECENT_ACTIONS, &events)?;
        Ok(event)
    }

    /// All kept events, oldest first
    pub fn events(&self) -> Vec<ActivityEvent> {
        self.storage.load_or_default(keys::RECENT_ACTIONS)
    }

    /// The `n` newest events, newest first
    pub fn latest(&self, n: usize) -> Vec<ActivityEvent> {
        let mut events = self.events();
        events.reverse();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(n);
        events
    }
}

/// Persisted engagement counters
#[derive(Clone)]
pub struct Counters {
    storage: Storage,
    clock: Arc<dyn Clock>,
}

impl Counters {
    pub fn new(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    pub fn shares(&self) -> u64 {
        self.storage.load_or_default(keys::SHARES_COUNT)
    }

    pub fn record_share(&self) -> Result<u64, StorageError> {
        self.increment(keys::SHARES_COUNT)
    }

    /// Number of collections; nothing in the reader creates collections yet
    pub fn collections(&self) -> u64 {
        self.storage.load_or_default(keys::COLLECTIONS_COUNT)
    }

    pub fn profile_views(&self, user_id: u32) -> u64 {
        self.storage.load_or_default(&keys::profile_views(user_id))
    }

    pub fn record_profile_view(&self, user_id: u32) -> Result<u64, StorageError> {
        self.increment(&keys::profile_views(user_id))
    }

    /// Times at which articles were opened
    pub fn reads(&self) -> Vec<DateTime<Utc>> {
        self.storage.load_or_default(keys::ARTICLE_READS)
    }

    /// Logs an article read at the current time
    pub fn record_read(&self) -> Result<usize, StorageError> {
        let mut reads = self.reads();
        reads.push(self.clock.now());
        self.storage.store(keys::ARTICLE_READS, &reads)?;
        Ok(reads.len())
    }

    fn increment(&self, key: &str) -> Result<u64, StorageError> {
        let next = self.storage.load_or_default::<u64>(key) + 1;
        self.storage.store(key, &next)?;
        Ok(next)
    }
}
