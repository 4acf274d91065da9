//! Local key-value store collaborator
//!
//! The host persists each collection as one JSON blob under a fixed key. The
//! engine only needs `get` and `set`; reads that fail for any reason come
//! back as "absent" so a damaged blob degrades to an empty collection.

use crate::error::EngineError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub const TASKS_KEY: &str = "tasks";
pub const FOCUS_SESSIONS_KEY: &str = "focus_sessions";
pub const MOODS_KEY: &str = "moods";
pub const PLANNER_KEY: &str = "planner";
pub const GOALS_KEY: &str = "goals";
pub const PROFILE_KEY: &str = "profile";

/// Keys holding snapshot collections
pub const COLLECTION_KEYS: [&str; 5] = [TASKS_KEY, FOCUS_SESSIONS_KEY, MOODS_KEY, PLANNER_KEY, GOALS_KEY];

/// Flat JSON key-value persistence
pub trait KeyValueStore: Send + Sync {
    /// Stored value for `key`, or `None` when absent or unreadable
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: Value) -> Result<(), EngineError>;
}

/// In-memory store, mostly for tests and short-lived hosts
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), EngineError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| EngineError::StorageError("memory store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Directory-backed store: one `<key>.json` file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, EngineError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(EngineError::StorageError(format!("invalid store key: {key:?}")));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        let path = self.path_for(key).ok()?;
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(key, path = %path.display(), error = %e, "failed to read store entry");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, path = %path.display(), error = %e, "corrupt store entry, treating as absent");
                None
            }
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<(), EngineError> {
        let path = self.path_for(key)?;
        let json = serde_json::to_string(&value)?;

        // Atomic replace via a temp file
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get(TASKS_KEY), None);

        store.set(TASKS_KEY, json!([{"title": "a"}])).unwrap();
        assert_eq!(store.get(TASKS_KEY), Some(json!([{"title": "a"}])));

        store.set(TASKS_KEY, json!([])).unwrap();
        assert_eq!(store.get(TASKS_KEY), Some(json!([])));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("data")).unwrap();

        assert_eq!(store.get(MOODS_KEY), None);
        store.set(MOODS_KEY, json!([{"label": "calm"}])).unwrap();
        assert_eq!(store.get(MOODS_KEY), Some(json!([{"label": "calm"}])));
        assert!(store.root().join("moods.json").exists());
        assert!(!store.root().join("moods.json.tmp").exists());
    }

    #[test]
    fn test_file_store_corrupt_entry_reads_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("tasks.json"), "{not json").unwrap();
        assert_eq!(store.get(TASKS_KEY), None);
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert!(store.set("../escape", json!(1)).is_err());
        assert_eq!(store.get("../escape"), None);
    }
}
