//! Namespaced response cache
//!
//! Stores API responses in the key-value store under a namespace prefix with
//! the time they were written. Entries older than the expiry window read as
//! absent, and a namespace is capped at a maximum number of entries by
//! evicting its oldest entry on overflow.

use chrono::Duration;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::storage::{Storage, StorageError};

/// Expiry and size limits of the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long an entry stays fresh
    pub expiry: Duration,
    /// Maximum number of entries per namespace
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiry: Duration::minutes(5),
            max_entries: 50,
        }
    }
}

/// Wrapper stored for each cached response
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// The cached data
    data: T,
    /// When the data was cached, in epoch milliseconds
    timestamp: i64,
}

/// Timestamp-only view of an entry, used while scanning for eviction
#[derive(Debug, Deserialize)]
struct EntryStamp {
    timestamp: i64,
}

/// Manages cached responses in the key-value store
#[derive(Clone)]
pub struct CacheStore {
    storage: Storage,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
}

impl CacheStore {
    pub fn new(storage: Storage, clock: Arc<dyn Clock>, config: CacheConfig) -> Self {
        Self {
            storage,
            clock,
            config,
        }
    }

    /// Derives the storage key for request parameters
    ///
    /// The key is the namespace followed by the compact JSON form of `params`;
    /// struct field order makes it stable across calls.
    pub fn cache_key<P: Serialize + ?Sized>(
        namespace: &str,
        params: &P,
    ) -> Result<String, StorageError> {
        Ok(format!("{}{}", namespace, serde_json::to_string(params)?))
    }

    /// Reads fresh data for `params`
    ///
    /// Returns `None` when no entry exists. Expired or malformed entries are
    /// deleted and also reported as `None`.
    pub fn get<T, P>(&self, namespace: &str, params: &P) -> Option<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let key = match Self::cache_key(namespace, params) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Could not derive cache key");
                return None;
            }
        };

        let raw = self.storage.raw(&key)?;
        let entry: CacheEntry<T> = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Dropping malformed cache entry");
                self.remove_quietly(&key);
                return None;
            }
        };

        let age = self.clock.now_millis() - entry.timestamp;
        if age > self.config.expiry.num_milliseconds() {
            debug!(key = %key, age_ms = age, "Cache entry expired");
            self.remove_quietly(&key);
            return None;
        }

        debug!(key = %key, "Cache hit");
        Some(entry.data)
    }

    /// Writes `data` for `params`, evicting the oldest entry on overflow
    pub fn set<T, P>(&self, namespace: &str, params: &P, data: &T) -> Result<(), StorageError>
    where
        T: Serialize,
        P: Serialize + ?Sized,
    {
        let key = Self::cache_key(namespace, params)?;
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now_millis(),
        };
        self.storage.store(&key, &entry)?;

        let keys = self.storage.keys_with_prefix(namespace);
        if keys.len() > self.config.max_entries {
            self.evict_oldest(&keys, &key)?;
        }
        Ok(())
    }

    /// Removes every entry of a namespace, returning how many were removed
    pub fn clear(&self, namespace: &str) -> Result<usize, StorageError> {
        let keys = self.storage.keys_with_prefix(namespace);
        for key in &keys {
            self.storage.remove(key)?;
        }
        debug!(namespace, removed = keys.len(), "Cleared cache namespace");
        Ok(keys.len())
    }

    /// Number of entries currently held in a namespace
    pub fn len(&self, namespace: &str) -> usize {
        self.storage.keys_with_prefix(namespace).len()
    }

    /// Linear scan for the entry with the smallest timestamp
    ///
    /// The entry just written is never a candidate. Entries whose timestamp
    /// cannot be read count as oldest.
    fn evict_oldest(&self, keys: &[String], just_written: &str) -> Result<(), StorageError> {
        let oldest = keys
            .iter()
            .filter(|k| k.as_str() != just_written)
            .min_by_key(|k| {
                self.storage
                    .raw(k)
                    .and_then(|v| serde_json::from_value::<EntryStamp>(v).ok())
                    .map(|s| s.timestamp)
                    .unwrap_or(i64::MIN)
            });

        if let Some(oldest) = oldest {
            debug!(key = %oldest, "Evicting oldest cache entry");
            self.storage.remove(oldest)?;
        }
        Ok(())
    }

    fn remove_quietly(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            warn!(key, error = %e, "Failed to remove cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Params {
        page: u32,
        page_size: u32,
        q: &'static str,
    }

    fn params(page: u32) -> Params {
        Params {
            page,
            page_size: 20,
            q: "",
        }
    }

    fn create_test_cache() -> (CacheStore, Arc<ManualClock>, Storage) {
        let clock = Arc::new(ManualClock::at(
            Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap(),
        ));
        let storage = Storage::in_memory();
        let cache = CacheStore::new(storage.clone(), clock.clone(), CacheConfig::default());
        (cache, clock, storage)
    }

    fn data(value: i32) -> TestData {
        TestData {
            name: format!("item-{}", value),
            value,
        }
    }

    #[test]
    fn test_cache_key_is_namespace_plus_params() {
        let key = CacheStore::cache_key("news_", &params(1)).unwrap();
        assert_eq!(key, r#"news_{"page":1,"pageSize":20,"q":""}"#);
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (cache, _clock, _storage) = create_test_cache();
        let result: Option<TestData> = cache.get("news_", &params(1));
        assert!(result.is_none());
    }

    #[test]
    fn test_set_then_get_returns_data() {
        let (cache, _clock, _storage) = create_test_cache();
        cache.set("news_", &params(1), &data(1)).expect("Set should succeed");

        let result: TestData = cache.get("news_", &params(1)).expect("Should hit");
        assert_eq!(result, data(1));
    }

    #[test]
    fn test_entry_is_fresh_at_expiry_boundary() {
        let (cache, clock, _storage) = create_test_cache();
        cache.set("news_", &params(1), &data(1)).unwrap();

        clock.advance(Duration::minutes(5));

        let result: Option<TestData> = cache.get("news_", &params(1));
        assert_eq!(result, Some(data(1)));
    }

    #[test]
    fn test_expired_entry_is_absent_and_deleted() {
        let (cache, clock, storage) = create_test_cache();
        cache.set("news_", &params(1), &data(1)).unwrap();

        clock.advance(Duration::minutes(5) + Duration::milliseconds(1));

        let result: Option<TestData> = cache.get("news_", &params(1));
        assert!(result.is_none());
        assert!(storage.keys_with_prefix("news_").is_empty());
    }

    #[test]
    fn test_malformed_entry_is_absent_and_deleted() {
        let (cache, _clock, storage) = create_test_cache();
        let key = CacheStore::cache_key("tag_", &params(1)).unwrap();
        storage.store(&key, &json!({"unexpected": true})).unwrap();

        let result: Option<TestData> = cache.get("tag_", &params(1));
        assert!(result.is_none());
        assert!(!storage.contains(&key));
    }

    #[test]
    fn test_overwrite_existing_entry() {
        let (cache, _clock, _storage) = create_test_cache();
        cache.set("news_", &params(1), &data(1)).unwrap();
        cache.set("news_", &params(1), &data(2)).unwrap();

        let result: TestData = cache.get("news_", &params(1)).unwrap();
        assert_eq!(result, data(2));
        assert_eq!(cache.len("news_"), 1);
    }

    #[test]
    fn test_overflow_evicts_globally_oldest() {
        let (cache, clock, _storage) = create_test_cache();

        for page in 1..=50 {
            cache.set("news_", &params(page), &data(page as i32)).unwrap();
            clock.advance(Duration::seconds(1));
        }
        assert_eq!(cache.len("news_"), 50);

        // Page 1 was written first and must be the one evicted
        cache.set("news_", &params(51), &data(51)).unwrap();
        assert_eq!(cache.len("news_"), 50);
        assert!(cache.get::<TestData, _>("news_", &params(1)).is_none());
        assert!(cache.get::<TestData, _>("news_", &params(2)).is_some());
        assert!(cache.get::<TestData, _>("news_", &params(51)).is_some());
    }

    #[test]
    fn test_many_inserts_keep_exactly_max_entries() {
        let (cache, clock, _storage) = create_test_cache();

        for page in 1..=75 {
            cache.set("rec_", &params(page), &data(page as i32)).unwrap();
            clock.advance(Duration::milliseconds(10));
            assert!(cache.len("rec_") <= 50);
        }

        assert_eq!(cache.len("rec_"), 50);
        // Survivors are the 50 most recent writes
        for page in 1..=25 {
            assert!(cache.get::<TestData, _>("rec_", &params(page)).is_none());
        }
        for page in 26..=75 {
            assert!(cache.get::<TestData, _>("rec_", &params(page)).is_some());
        }
    }

    #[test]
    fn test_rewritten_entry_is_not_oldest_anymore() {
        let (cache, clock, _storage) = create_test_cache();
        for page in 1..=50 {
            cache.set("news_", &params(page), &data(1)).unwrap();
            clock.advance(Duration::seconds(1));
        }

        // Refresh page 1 so page 2 becomes the oldest
        cache.set("news_", &params(1), &data(1)).unwrap();
        clock.advance(Duration::seconds(1));
        cache.set("news_", &params(51), &data(51)).unwrap();

        assert!(cache.get::<TestData, _>("news_", &params(1)).is_some());
        assert!(cache.get::<TestData, _>("news_", &params(2)).is_none());
    }

    #[test]
    fn test_same_timestamp_never_evicts_new_entry() {
        let (cache, _clock, _storage) = create_test_cache();
        for page in 1..=51 {
            cache.set("tag_", &params(page), &data(1)).unwrap();
        }
        assert_eq!(cache.len("tag_"), 50);
        assert!(cache.get::<TestData, _>("tag_", &params(51)).is_some());
    }

    #[test]
    fn test_namespaces_are_independent() {
        let (cache, clock, _storage) = create_test_cache();
        for page in 1..=50 {
            cache.set("news_", &params(page), &data(1)).unwrap();
            clock.advance(Duration::seconds(1));
        }
        cache.set("tag_", &params(1), &data(2)).unwrap();

        assert_eq!(cache.len("news_"), 50);
        assert_eq!(cache.len("tag_"), 1);
    }

    #[test]
    fn test_clear_removes_only_namespace() {
        let (cache, _clock, storage) = create_test_cache();
        cache.set("news_", &params(1), &data(1)).unwrap();
        cache.set("news_", &params(2), &data(2)).unwrap();
        cache.set("tag_", &params(1), &data(3)).unwrap();
        storage.store("likedArticles", &Vec::<u8>::new()).unwrap();

        let removed = cache.clear("news_").unwrap();

        assert_eq!(removed, 2);
        assert_eq!(cache.len("news_"), 0);
        assert_eq!(cache.len("tag_"), 1);
        assert!(storage.contains("likedArticles"));
    }

    #[test]
    fn test_custom_config_limits() {
        let clock = Arc::new(ManualClock::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let cache = CacheStore::new(
            Storage::in_memory(),
            clock.clone(),
            CacheConfig {
                expiry: Duration::seconds(1),
                max_entries: 2,
            },
        );

        for page in 1..=3 {
            cache.set("news_", &params(page), &data(1)).unwrap();
            clock.advance(Duration::milliseconds(100));
        }
        assert_eq!(cache.len("news_"), 2);

        clock.advance(Duration::seconds(2));
        assert!(cache.get::<TestData, _>("news_", &params(3)).is_none());
    }
}
