//! User engagement actions
//!
//! [`Engagement`] ties the action sets, comments, activity log, counters and
//! friend lists together so that each user gesture updates every record it
//! touches and yields the notice shown to the user.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::actions::{ActionKind, ActionStore, UNKNOWN_TAG};
use crate::activity::{ActivityKind, ActivityLog, Counters};
use crate::clock::Clock;
use crate::comments::{Comment, CommentError, CommentStore};
use crate::data::Article;
use crate::friends::{FriendGraph, CURRENT_USER_ID};
use crate::share::ShareLinks;
use crate::storage::{Storage, StorageError};

/// Category of a notice, used for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    LikeSuccess,
    LikeReset,
    DislikeSuccess,
    DislikeReset,
    SaveSuccess,
    SaveReset,
    FriendAdded,
    FriendRemoved,
    Info,
    Error,
}

impl NoticeKind {
    /// Whether the notice confirms something was added
    pub fn is_positive(self) -> bool {
        matches!(
            self,
            NoticeKind::LikeSuccess | NoticeKind::SaveSuccess | NoticeKind::FriendAdded
        )
    }
}

/// Short message shown after an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

impl Notice {
    pub fn new(message: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NoticeKind::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NoticeKind::Error)
    }
}

/// All per-user engagement state
pub struct Engagement {
    actions: ActionStore,
    comments: CommentStore,
    activity: ActivityLog,
    counters: Counters,
    friends: FriendGraph,
}

impl Engagement {
    /// Loads engagement state from `storage`
    pub fn load(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        Self {
            actions: ActionStore::load(storage.clone(), clock.clone()),
            comments: CommentStore::new(storage.clone(), clock.clone()),
            activity: ActivityLog::new(storage.clone(), clock.clone()),
            counters: Counters::new(storage.clone(), clock),
            friends: FriendGraph::new(storage),
        }
    }

    /// Toggles a like; `tag` is the topic being browsed, if any
    pub fn like(&mut self, article: &Article, tag: Option<&str>) -> Result<Notice, StorageError> {
        let tag = tag.filter(|t| !t.trim().is_empty()).unwrap_or(UNKNOWN_TAG);
        let liked = self.actions.toggle_tagged(ActionKind::Like, article, Some(tag))?;
        self.log_activity(ActivityKind::Like, article, Some(tag));

        Ok(if liked {
            Notice::new("We'll recommend more stories like this", NoticeKind::LikeSuccess)
        } else {
            Notice::new("It's okay to change your mind", NoticeKind::LikeReset)
        })
    }

    pub fn dislike(&mut self, article: &Article) -> Result<Notice, StorageError> {
        let disliked = self.actions.toggle(ActionKind::Dislike, article)?;
        self.log_activity(ActivityKind::Dislike, article, None);

        Ok(if disliked {
            Notice::new("We won't recommend stories like this", NoticeKind::DislikeSuccess)
        } else {
            Notice::new("It's okay to change your mind", NoticeKind::DislikeReset)
        })
    }

    pub fn save(&mut self, article: &Article) -> Result<Notice, StorageError> {
        let saved = self.actions.toggle(ActionKind::Save, article)?;
        self.log_activity(ActivityKind::Save, article, None);

        Ok(if saved {
            Notice::new("Item saved for later", NoticeKind::SaveSuccess)
        } else {
            Notice::new("Item deleted from saves", NoticeKind::SaveReset)
        })
    }

    /// Counts a share and returns the links to offer
    pub fn share(&self, article: &Article) -> Result<ShareLinks, StorageError> {
        self.counters.record_share()?;
        self.log_activity(ActivityKind::Share, article, None);
        Ok(ShareLinks::for_article(article))
    }

    /// Posts a comment; invalid input changes nothing
    pub fn comment(&self, article: &Article, input: &str) -> Result<Comment, CommentError> {
        let comment = self.comments.post(&article.identity(), input)?;
        self.log_activity(ActivityKind::Comment, article, None);
        Ok(comment)
    }

    pub fn delete_comment(&self, article: &Article, comment_id: i64) -> Result<bool, StorageError> {
        self.comments.delete(&article.identity(), comment_id)
    }

    /// Logs that an article was opened
    pub fn read(&self, article: &Article) -> Result<usize, StorageError> {
        debug!(url = %article.url, "Article opened");
        self.counters.record_read()
    }

    /// Logs a visit to the current user's profile
    pub fn view_profile(&self) -> Result<u64, StorageError> {
        self.counters.record_profile_view(CURRENT_USER_ID)
    }

    /// Adds or removes a friend; returns `None` for the current user's own id
    pub fn toggle_friend(&self, friend_id: u32) -> Result<Option<Notice>, StorageError> {
        if friend_id == CURRENT_USER_ID {
            return Ok(None);
        }
        let added = self.friends.toggle(friend_id)?;
        Ok(Some(if added {
            Notice::new("You have added a new friend!", NoticeKind::FriendAdded)
        } else {
            Notice::new("Your friend has been deleted.", NoticeKind::FriendRemoved)
        }))
    }

    /// Appends to the activity log; the action itself is already stored
    fn log_activity(&self, kind: ActivityKind, article: &Article, tag: Option<&str>) {
        if let Err(e) = self.activity.record(kind, &article.title, tag) {
            warn!(error = %e, ?kind, "Failed to record activity");
        }
    }

    pub fn actions(&self) -> &ActionStore {
        &self.actions
    }

    pub fn comments(&self) -> &CommentStore {
        &self.comments
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn friends(&self) -> &FriendGraph {
        &self.friends
    }
}
