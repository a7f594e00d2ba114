//! Mirrored friend lists
//!
//! Friendship is stored twice: the friend's id in the current user's list and
//! the current user's id in the friend's list. Both sides change together.

use tracing::debug;

use crate::storage::{keys, Storage, StorageError};

/// Id of the signed-in user
pub const CURRENT_USER_ID: u32 = 0;

#[derive(Clone)]
pub struct FriendGraph {
    storage: Storage,
}

impl FriendGraph {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Friend ids of `user_id` in the order they were added
    pub fn friends_of(&self, user_id: u32) -> Vec<u32> {
        self.storage.load_or_default(&keys::friends_list(user_id))
    }

    /// Friends of the current user
    pub fn friends(&self) -> Vec<u32> {
        self.friends_of(CURRENT_USER_ID)
    }

    pub fn is_friend(&self, friend_id: u32) -> bool {
        self.friends().contains(&friend_id)
    }

    /// Adds or removes `friend_id` for the current user
    ///
    /// Returns whether they are friends afterwards. The current user cannot
    /// befriend themselves; that toggle changes nothing and returns `false`.
    pub fn toggle(&self, friend_id: u32) -> Result<bool, StorageError> {
        if friend_id == CURRENT_USER_ID {
            return Ok(false);
        }

        let mut mine = self.friends();
        let mut theirs = self.friends_of(friend_id);
        let adding = !mine.contains(&friend_id);

        if adding {
            mine.push(friend_id);
            if !theirs.contains(&CURRENT_USER_ID) {
                theirs.push(CURRENT_USER_ID);
            }
        } else {
            mine.retain(|&id| id != friend_id);
            theirs.retain(|&id| id != CURRENT_USER_ID);
        }

        self.storage.store(&keys::friends_list(CURRENT_USER_ID), &mine)?;
        self.storage.store(&keys::friends_list(friend_id), &theirs)?;
        debug!(friend_id, adding, "Toggled friend");
        Ok(adding)
    }
}
