//! Persistent key-value storage
//!
//! Every piece of persisted state (caches, action sets, comments, counters and
//! friend lists) goes through a [`Storage`] handle wrapping a [`KeyValueStore`]
//! backend. The handle owns JSON (de)serialization and recovers from malformed
//! entries by logging them and treating them as absent.

mod file;
pub mod keys;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;
#[cfg(test)]
pub(crate) use memory::FailingStore;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Errors that can occur when persisting values
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be converted to or from JSON
    #[error("Failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No data directory could be determined for the file store
    #[error("No data directory available")]
    NoDataDir,
}

/// Raw key-value backend holding JSON values
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any
    fn read(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`, replacing any previous value
    fn write(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Removes `key`; removing a missing key is not an error
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Returns every key currently stored
    fn keys(&self) -> Vec<String>;
}

/// Cloneable, typed handle over a shared [`KeyValueStore`]
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("keys", &self.backend.keys().len())
            .finish()
    }
}

impl Storage {
    /// Wraps a backend in a shared handle
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Creates a handle over a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Loads and deserializes the value under `key`
    ///
    /// Returns `None` when the key is missing. A value that does not match `T`
    /// is logged and also reported as `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.backend.read(key)?;
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(key, error = %e, "Ignoring malformed stored value");
                None
            }
        }
    }

    /// Loads the value under `key`, falling back to `T::default()`
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load(key).unwrap_or_default()
    }

    /// Serializes and stores `value` under `key`
    pub fn store<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value)?;
        self.backend.write(key, value)
    }

    /// Returns the raw JSON under `key` without interpreting it
    pub fn raw(&self, key: &str) -> Option<Value> {
        self.backend.read(key)
    }

    /// Removes `key`
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(key)
    }

    /// Returns whether a value exists under `key`
    pub fn contains(&self, key: &str) -> bool {
        self.backend.read(key).is_some()
    }

    /// Returns all keys beginning with `prefix`, sorted
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .backend
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect();
        keys.sort();
        keys
    }
}
