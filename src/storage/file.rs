//! Disk-backed key-value store
//!
//! Keeps all entries in one JSON document (`store.json`) inside an
//! XDG-compliant data directory and rewrites it after every mutation.

use directories::ProjectDirs;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::{KeyValueStore, StorageError};

/// Name of the document holding all entries
const STORE_FILE: &str = "store.json";

/// Key-value store persisted to a JSON file
#[derive(Debug)]
pub struct FileStore {
    /// Directory containing the store file
    data_dir: PathBuf,
    /// In-memory copy of the file contents
    entries: Mutex<BTreeMap<String, Value>>,
}

impl FileStore {
    /// Returns the default data directory (`~/.local/share/pocketfeed` on Linux)
    pub fn default_dir() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "pocketfeed")?;
        Some(project_dirs.data_dir().to_path_buf())
    }

    /// Opens the store in the default data directory
    pub fn open_default() -> Result<Self, StorageError> {
        let dir = Self::default_dir().ok_or(StorageError::NoDataDir)?;
        Self::open(dir)
    }

    /// Opens the store in `data_dir`, creating the directory if missing
    ///
    /// A store file that cannot be parsed is logged and replaced by an empty
    /// store on the next write.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;

        let path = data_dir.join(STORE_FILE);
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Store file is malformed, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = entries.len(), "Opened store");

        Ok(Self {
            data_dir,
            entries: Mutex::new(entries),
        })
    }

    /// Directory holding the store file
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(self.store_path(), json)?;
        Ok(())
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Option<Value> {
        self.entries().get(key).cloned()
    }

    fn write(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut entries = self.entries();
        entries.insert(key.to_string(), value);
        self.persist(&entries)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }
}
