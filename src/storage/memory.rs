use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{KeyValueStore, StorageError};

/// Process-local store that forgets everything on exit
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Option<Value> {
        self.entries().get(key).cloned()
    }

    fn write(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }
}

/// Memory store whose writes to selected keys fail
#[cfg(test)]
#[derive(Clone, Default)]
pub struct FailingStore {
    inner: std::sync::Arc<MemoryStore>,
    failing: std::sync::Arc<Mutex<Vec<String>>>,
}

#[cfg(test)]
impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later write to `key` fail
    pub fn fail_writes_to(&self, key: &str) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(key.to_string());
    }
}

#[cfg(test)]
impl KeyValueStore for FailingStore {
    fn read(&self, key: &str) -> Option<Value> {
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        if failing.iter().any(|k| k == key) {
            return Err(std::io::Error::other(format!("write to {} refused", key)).into());
        }
        self.inner.write(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.delete(key)
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }
}
