//! Like, dislike and save sets
//!
//! Each set is an ordered list of article records persisted under its own key.
//! Liking and disliking the same article are mutually exclusive; saving is
//! independent of both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::data::{Article, ArticleId};
use crate::storage::{keys, Storage, StorageError};

/// Tag recorded on likes made outside a tag feed
pub const UNKNOWN_TAG: &str = "unknown";

/// The three user action sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Like,
    Dislike,
    Save,
}

impl ActionKind {
    /// Storage key of the set
    pub fn storage_key(self) -> &'static str {
        match self {
            ActionKind::Like => keys::LIKED_ARTICLES,
            ActionKind::Dislike => keys::DISLIKED_ARTICLES,
            ActionKind::Save => keys::SAVED_ARTICLES,
        }
    }

    /// The set cleared when this one gains an article
    fn opposite(self) -> Option<ActionKind> {
        match self {
            ActionKind::Like => Some(ActionKind::Dislike),
            ActionKind::Dislike => Some(ActionKind::Like),
            ActionKind::Save => None,
        }
    }
}

/// Like/dislike state of one article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reaction {
    #[default]
    Neutral,
    Liked,
    Disliked,
}

/// An article as stored in an action set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    #[serde(flatten)]
    pub article: Article,
    pub action_timestamp: DateTime<Utc>,
    /// Topic active when a like happened
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl ActionRecord {
    pub fn identity(&self) -> ArticleId {
        self.article.identity()
    }
}

/// In-memory view of the action sets, written through to storage
pub struct ActionStore {
    storage: Storage,
    clock: Arc<dyn Clock>,
    liked: Vec<ActionRecord>,
    disliked: Vec<ActionRecord>,
    saved: Vec<ActionRecord>,
}

impl ActionStore {
    /// Loads all three sets; missing or malformed sets start empty
    pub fn load(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        let liked = storage.load_or_default(keys::LIKED_ARTICLES);
        let disliked = storage.load_or_default(keys::DISLIKED_ARTICLES);
        let saved = storage.load_or_default(keys::SAVED_ARTICLES);
        Self {
            storage,
            clock,
            liked,
            disliked,
            saved,
        }
    }

    /// Toggles `article` in a set without a topic
    ///
    /// Likes made this way are tagged [`UNKNOWN_TAG`].
    pub fn toggle(&mut self, kind: ActionKind, article: &Article) -> Result<bool, StorageError> {
        self.toggle_tagged(kind, article, None)
    }

    /// Toggles `article` in a set
    ///
    /// Returns the new membership. Adding to likes or dislikes removes the
    /// article from the other set. The toggled set is written first; if the
    /// other set then fails to persist, the toggled set is written back and
    /// nothing changes in memory.
    pub fn toggle_tagged(
        &mut self,
        kind: ActionKind,
        article: &Article,
        tag: Option<&str>,
    ) -> Result<bool, StorageError> {
        let id = article.identity();
        let mut target = self.records(kind).to_vec();

        let member = match target.iter().position(|r| r.identity() == id) {
            Some(index) => {
                target.remove(index);
                false
            }
            None => {
                let tag = match kind {
                    ActionKind::Like => Some(tag.unwrap_or(UNKNOWN_TAG).to_string()),
                    _ => None,
                };
                target.push(ActionRecord {
                    article: article.clone(),
                    action_timestamp: self.clock.now(),
                    tag,
                });
                true
            }
        };

        self.storage.store(kind.storage_key(), &target)?;

        let opposite = match kind.opposite() {
            Some(other) => {
                let mut records = self.records(other).to_vec();
                records.retain(|r| r.identity() != id);
                if let Err(e) = self.storage.store(other.storage_key(), &records) {
                    // Put the first set back so storage matches memory again
                    if let Err(restore) = self.storage.store(kind.storage_key(), self.records(kind)) {
                        warn!(error = %restore, ?kind, "Failed to restore action set");
                    }
                    return Err(e);
                }
                Some((other, records))
            }
            None => None,
        };

        *self.records_mut(kind) = target;
        if let Some((other, records)) = opposite {
            *self.records_mut(other) = records;
        }
        debug!(?kind, id = %id, member, "Toggled article");
        Ok(member)
    }

    /// Records of one set in insertion order
    pub fn records(&self, kind: ActionKind) -> &[ActionRecord] {
        match kind {
            ActionKind::Like => &self.liked,
            ActionKind::Dislike => &self.disliked,
            ActionKind::Save => &self.saved,
        }
    }

    fn records_mut(&mut self, kind: ActionKind) -> &mut Vec<ActionRecord> {
        match kind {
            ActionKind::Like => &mut self.liked,
            ActionKind::Dislike => &mut self.disliked,
            ActionKind::Save => &mut self.saved,
        }
    }

    pub fn contains(&self, kind: ActionKind, id: &ArticleId) -> bool {
        self.records(kind).iter().any(|r| &r.identity() == id)
    }

    pub fn count(&self, kind: ActionKind) -> usize {
        self.records(kind).len()
    }

    pub fn reaction(&self, id: &ArticleId) -> Reaction {
        if self.contains(ActionKind::Like, id) {
            Reaction::Liked
        } else if self.contains(ActionKind::Dislike, id) {
            Reaction::Disliked
        } else {
            Reaction::Neutral
        }
    }

    pub fn is_saved(&self, id: &ArticleId) -> bool {
        self.contains(ActionKind::Save, id)
    }

    /// Articles of one set, without action metadata
    pub fn articles(&self, kind: ActionKind) -> Vec<Article> {
        self.records(kind).iter().map(|r| r.article.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::FailingStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()))
    }

    fn store() -> (ActionStore, Storage) {
        let storage = Storage::in_memory();
        (ActionStore::load(storage.clone(), clock()), storage)
    }

    fn article(url: &str) -> Article {
        Article::new(url, "Title")
    }

    #[test]
    fn test_like_twice_returns_to_neutral() {
        let (mut actions, storage) = store();
        let a = article("https://a.example/1");

        assert!(actions.toggle(ActionKind::Like, &a).unwrap());
        assert_eq!(actions.reaction(&a.identity()), Reaction::Liked);

        assert!(!actions.toggle(ActionKind::Like, &a).unwrap());
        assert_eq!(actions.reaction(&a.identity()), Reaction::Neutral);
        assert_eq!(storage.raw(keys::LIKED_ARTICLES), Some(json!([])));
    }

    #[test]
    fn test_dislike_clears_like() {
        let (mut actions, storage) = store();
        let a = article("https://a.example/1");

        actions.toggle(ActionKind::Like, &a).unwrap();
        actions.toggle(ActionKind::Dislike, &a).unwrap();

        assert_eq!(actions.reaction(&a.identity()), Reaction::Disliked);
        assert_eq!(actions.count(ActionKind::Like), 0);
        assert_eq!(actions.count(ActionKind::Dislike), 1);
        let liked: Vec<ActionRecord> = storage.load(keys::LIKED_ARTICLES).unwrap();
        assert!(liked.is_empty());
    }

    #[test]
    fn test_like_clears_dislike() {
        let (mut actions, _storage) = store();
        let a = article("https://a.example/1");

        actions.toggle(ActionKind::Dislike, &a).unwrap();
        actions.toggle(ActionKind::Like, &a).unwrap();

        assert_eq!(actions.reaction(&a.identity()), Reaction::Liked);
        assert!(!actions.contains(ActionKind::Dislike, &a.identity()));
    }

    #[test]
    fn test_save_is_independent() {
        let (mut actions, _storage) = store();
        let a = article("https://a.example/1");

        actions.toggle(ActionKind::Like, &a).unwrap();
        assert!(actions.toggle(ActionKind::Save, &a).unwrap());
        actions.toggle(ActionKind::Dislike, &a).unwrap();

        assert!(actions.is_saved(&a.identity()));
        assert_eq!(actions.reaction(&a.identity()), Reaction::Disliked);
    }

    #[test]
    fn test_identity_prefers_id() {
        let (mut actions, _storage) = store();
        let mut first = article("https://a.example/1");
        first.id = Some("abc".to_string());
        let mut second = article("https://a.example/other");
        second.id = Some("abc".to_string());

        actions.toggle(ActionKind::Save, &first).unwrap();

        assert!(actions.is_saved(&second.identity()));
        assert!(!actions.toggle(ActionKind::Save, &second).unwrap());
    }

    #[test]
    fn test_like_records_tag_and_timestamp() {
        let (mut actions, storage) = store();

        actions
            .toggle_tagged(ActionKind::Like, &article("https://a.example/1"), Some("travel"))
            .unwrap();
        actions.toggle(ActionKind::Like, &article("https://a.example/2")).unwrap();
        actions.toggle(ActionKind::Save, &article("https://a.example/3")).unwrap();

        let raw = storage.raw(keys::LIKED_ARTICLES).unwrap();
        assert_eq!(raw[0]["url"], "https://a.example/1");
        assert_eq!(raw[0]["tag"], "travel");
        assert_eq!(raw[0]["actionTimestamp"], "2024-07-15T12:00:00Z");
        assert_eq!(raw[1]["tag"], UNKNOWN_TAG);
        assert!(actions.records(ActionKind::Save)[0].tag.is_none());
    }

    #[test]
    fn test_reload_from_storage() {
        let (mut actions, storage) = store();
        let a = article("https://a.example/1");
        actions.toggle(ActionKind::Save, &a).unwrap();

        let reloaded = ActionStore::load(storage, clock());

        assert!(reloaded.is_saved(&a.identity()));
        assert_eq!(reloaded.articles(ActionKind::Save), vec![a]);
    }

    #[test]
    fn test_failed_write_keeps_other_set() {
        let backend = FailingStore::new();
        let storage = Storage::new(backend.clone());
        let mut actions = ActionStore::load(storage.clone(), clock());
        let a = article("https://a.example/1");
        actions.toggle(ActionKind::Dislike, &a).unwrap();

        backend.fail_writes_to(keys::LIKED_ARTICLES);
        assert!(actions.toggle(ActionKind::Like, &a).is_err());

        assert_eq!(actions.reaction(&a.identity()), Reaction::Disliked);
        let reloaded = ActionStore::load(storage, clock());
        assert_eq!(reloaded.count(ActionKind::Dislike), 1);
        assert_eq!(reloaded.count(ActionKind::Like), 0);
    }

    #[test]
    fn test_failed_second_write_restores_first() {
        let backend = FailingStore::new();
        let storage = Storage::new(backend.clone());
        let mut actions = ActionStore::load(storage.clone(), clock());
        let a = article("https://a.example/1");
        actions.toggle(ActionKind::Dislike, &a).unwrap();

        backend.fail_writes_to(keys::DISLIKED_ARTICLES);
        assert!(actions.toggle(ActionKind::Like, &a).is_err());

        assert_eq!(actions.reaction(&a.identity()), Reaction::Disliked);
        let reloaded = ActionStore::load(storage, clock());
        assert_eq!(reloaded.count(ActionKind::Like), 0);
        assert_eq!(reloaded.count(ActionKind::Dislike), 1);
    }

    #[test]
    fn test_malformed_set_loads_empty() {
        let storage = Storage::in_memory();
        storage.store(keys::LIKED_ARTICLES, &json!({"not": "a list"})).unwrap();

        let actions = ActionStore::load(storage, clock());

        assert_eq!(actions.count(ActionKind::Like), 0);
    }
}
