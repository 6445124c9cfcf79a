//! Durable mirror: write-through persistence of cache entries
//!
//! Every cache write is mirrored here so a fresh process (or a failed
//! fetch) has something to show. The mirror is best-effort: a storage
//! failure is logged and never fails the mutation that caused it.

use crate::error::StorageError;
use crate::types::{CachedList, Entity, ScopeKey};
use crate::validate::decode_list_lenient;
use dashmap::DashMap;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use ulid::Ulid;

/// Synchronous string-keyed JSON store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process store; contents are lost with the process
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: DashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw text under a key, bypassing serialization
    pub fn insert_raw(&self, key: impl Into<String>, raw: impl Into<String>) {
        self.entries.insert(key.into(), raw.into());
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let Some(raw) = self.entries.get(key).map(|e| e.value().clone()) else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Create the store, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a key; keys are percent-encoded so `:` and `/` are safe
    fn path_for(&self, key: &str) -> PathBuf {
        let encoded: String = url::form_urlencoded::byte_serialize(key.as_bytes()).collect();
        self.root.join(format!("{}.json", encoded))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let content = serde_json::to_vec(&value).map_err(|e| StorageError::Rejected {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        atomic_write(&path, &content)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// Atomic write via temp file and rename
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(io_err)?;

    // One temp file per writer; concurrent saves of a key must not share it
    let temp_path = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&temp_path, content).map_err(io_err)?;
    if let Err(source) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_err(source));
    }
    Ok(())
}

/// Scope-keyed view over a [`KeyValueStore`]
#[derive(Clone)]
pub struct DurableMirror {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl DurableMirror {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// A mirror over a fresh [`MemoryKeyValueStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()), "")
    }

    /// Storage key for a scope
    pub fn key(&self, scope: &ScopeKey) -> String {
        format!("{}{}", self.prefix, scope)
    }

    /// Persist a typed list. Failures are logged, never returned.
    pub fn save<E: Entity>(&self, scope: &ScopeKey, list: &[E]) {
        match serde_json::to_value(list) {
            Ok(value) => self.put(scope, value),
            Err(e) => warn!(%scope, error = %e, "mirror: failed to serialize list"),
        }
    }

    /// Persist a type-erased list. Failures are logged, never returned.
    pub fn save_list(&self, scope: &ScopeKey, list: &CachedList) {
        match serde_json::to_value(list) {
            Ok(value) => self.put(scope, value),
            Err(e) => warn!(%scope, error = %e, "mirror: failed to serialize list"),
        }
    }

    fn put(&self, scope: &ScopeKey, value: Value) {
        let key = self.key(scope);
        match self.store.set(&key, value) {
            Ok(()) => debug!(%key, "mirror write"),
            Err(e) => warn!(%key, error = %e, "mirror write failed"),
        }
    }

    /// Load a typed list; `None` when missing or unreadable.
    ///
    /// Malformed elements are dropped individually.
    pub fn load<E: Entity>(&self, scope: &ScopeKey) -> Option<Vec<E>> {
        let key = self.key(scope);
        match self.store.get(&key) {
            Ok(Some(value)) => decode_list_lenient(value),
            Ok(None) => None,
            Err(e) => {
                warn!(%key, error = %e, "mirror read failed");
                None
            }
        }
    }

    /// Load a type-erased list for the scope's kind
    pub fn load_list(&self, scope: &ScopeKey) -> Option<CachedList> {
        use crate::types::{Board, Column, EntityKind, Task};
        match scope.kind() {
            EntityKind::Board => self.load::<Board>(scope).map(Board::wrap),
            EntityKind::Column => self.load::<Column>(scope).map(Column::wrap),
            EntityKind::Task => self.load::<Task>(scope).map(Task::wrap),
        }
    }

    /// Drop the scope's entry. Failures are logged, never returned.
    pub fn remove(&self, scope: &ScopeKey) {
        let key = self.key(scope);
        match self.store.remove(&key) {
            Ok(()) => debug!(%key, "mirror remove"),
            Err(e) => warn!(%key, error = %e, "mirror remove failed"),
        }
    }
}

impl std::fmt::Debug for DurableMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableMirror")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, Task};
    use tempfile::TempDir;
    use tracing_test::traced_test;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
            Err(StorageError::Corrupt {
                key: key.to_string(),
                message: "unreadable".into(),
            })
        }

        fn set(&self, key: &str, _value: Value) -> Result<(), StorageError> {
            Err(StorageError::Rejected {
                key: key.to_string(),
                message: "quota exceeded".into(),
            })
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::new("1", "Todo", "b").with_position(0),
            Column::new("2", "Done", "b").with_position(1),
        ]
    }

    #[test]
    fn test_memory_round_trip_with_prefix() {
        let store = Arc::new(MemoryKeyValueStore::new());
        let mirror = DurableMirror::new(store.clone(), "kanban:");
        let scope = ScopeKey::columns("b");
        mirror.save(&scope, &columns());

        assert_eq!(store.keys(), vec!["kanban:columns:b".to_string()]);
        assert_eq!(mirror.load::<Column>(&scope).unwrap(), columns());

        mirror.remove(&scope);
        assert!(mirror.load::<Column>(&scope).is_none());
    }

    #[test]
    fn test_malformed_entry_is_none() {
        let store = Arc::new(MemoryKeyValueStore::new());
        store.insert_raw("tasks:1", "{not json");
        let mirror = DurableMirror::new(store, "");
        assert!(mirror.load::<Task>(&ScopeKey::tasks("1")).is_none());
    }

    #[test]
    fn test_load_list_matches_scope_kind() {
        let mirror = DurableMirror::in_memory();
        let scope = ScopeKey::tasks("c");
        mirror.save(&scope, &[Task::new("t", "T", "c")]);
        let list = mirror.load_list(&scope).unwrap();
        assert_eq!(list.ids(), vec![crate::types::EntityId::from("t")]);
    }

    #[test]
    #[traced_test]
    fn test_write_failure_is_swallowed() {
        let mirror = DurableMirror::new(Arc::new(BrokenStore), "");
        mirror.save(&ScopeKey::boards(), &Vec::<crate::types::Board>::new());
        assert!(logs_contain("mirror write failed"));
        assert!(mirror.load::<crate::types::Board>(&ScopeKey::boards()).is_none());
        assert!(logs_contain("mirror read failed"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = FileKeyValueStore::open(temp.path().join("mirror")).unwrap();
        let key = "tasks:a/b";
        assert!(store.get(key).unwrap().is_none());

        store.set(key, serde_json::json!([1, 2])).unwrap();
        assert_eq!(store.get(key).unwrap(), Some(serde_json::json!([1, 2])));

        let files: Vec<_> = fs::read_dir(store.root()).unwrap().collect();
        assert_eq!(files.len(), 1);

        store.remove(key).unwrap();
        store.remove(key).unwrap();
        assert!(store.get(key).unwrap().is_none());
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let store = FileKeyValueStore::open(temp.path()).unwrap();
        fs::write(store.path_for("boards"), "][").unwrap();
        assert!(matches!(
            store.get("boards"),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_file_store_concurrent_writes_to_one_key() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(FileKeyValueStore::open(temp.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|writer| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..50)
                        .filter(|round| {
                            store
                                .set("columns:b", serde_json::json!([writer, round]))
                                .is_err()
                        })
                        .count()
                })
            })
            .collect();
        let failures: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(failures, 0);
        assert!(store.get("columns:b").unwrap().is_some());
        let leftovers: Vec<_> = fs::read_dir(store.root())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".tmp_"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
