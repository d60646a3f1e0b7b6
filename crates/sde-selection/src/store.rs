//! Key-value persistence for client-side hints
//!
//! The engine never depends on a concrete backend: anything implementing
//! [`KeyValueStore`] can hold the warm-start hints.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Debug, Display, Formatter};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying I/O failed
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be decoded
    #[error("corrupt store data: {0}")]
    Corrupt(String),

    /// Value could not be encoded
    #[error("failed to encode value: {0}")]
    Encode(String),
}

/// Key namespaced by a scope (typically the client id)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedKey {
    scope: String,
    name: String,
}

impl ScopedKey {
    /// Create key `scope:name`
    #[inline]
    #[must_use]
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }

    /// Scope part
    #[inline]
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Name part
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for ScopedKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.name)
    }
}

/// String key-value store
pub trait KeyValueStore: Send + Sync + Debug {
    /// Read a value
    ///
    /// # Errors
    /// Returns error if the backend cannot be read
    fn get(&self, key: &ScopedKey) -> Result<Option<String>, StoreError>;

    /// Write a value
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    fn set(&self, key: &ScopedKey, value: &str) -> Result<(), StoreError>;

    /// Delete a value; missing keys are not an error
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    fn remove(&self, key: &ScopedKey) -> Result<(), StoreError>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &ScopedKey) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().get(&key.to_string()).cloned())
    }

    fn set(&self, key: &ScopedKey, value: &str) -> Result<(), StoreError> {
        self.inner.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &ScopedKey) -> Result<(), StoreError> {
        self.inner.lock().remove(&key.to_string());
        Ok(())
    }
}

/// JSON-file store
///
/// The whole map is rewritten on every change through a temporary file in
/// the same directory, then renamed over the target.
pub struct FileStore {
    path: PathBuf,
    inner: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading it if it exists
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or decoded
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let map = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|e| StoreError::Corrupt(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            inner: Mutex::new(map),
        })
    }

    /// Backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, map: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let body = serde_json::to_vec_pretty(map).map_err(|e| StoreError::Encode(e.to_string()))?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(&body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl Debug for FileStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore").field("path", &self.path).finish_non_exhaustive()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &ScopedKey) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().get(&key.to_string()).cloned())
    }

    fn set(&self, key: &ScopedKey, value: &str) -> Result<(), StoreError> {
        let mut map = self.inner.lock();
        let mut next = map.clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(&next)?;
        *map = next;
        Ok(())
    }

    fn remove(&self, key: &ScopedKey) -> Result<(), StoreError> {
        let mut map = self.inner.lock();
        let mut next = map.clone();
        if next.remove(&key.to_string()).is_some() {
            self.flush(&next)?;
            *map = next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scoped_key_display() {
        assert_eq!(ScopedKey::new("acme", "industry").to_string(), "acme:industry");
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        let key = ScopedKey::new("acme", "industry");

        assert_eq!(store.get(&key).unwrap(), None);
        store.set(&key, "healthcare").unwrap();
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("healthcare"));
        store.remove(&key).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn scopes_do_not_collide() {
        let store = MemoryStore::new();
        store.set(&ScopedKey::new("a", "k"), "1").unwrap();
        store.set(&ScopedKey::new("b", "k"), "2").unwrap();

        assert_eq!(store.get(&ScopedKey::new("a", "k")).unwrap().as_deref(), Some("1"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hints.json");
        let key = ScopedKey::new("acme", "industry");

        FileStore::open(&path).unwrap().set(&key, "finance").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(&key).unwrap().as_deref(), Some("finance"));
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("state");
        let key = ScopedKey::new("acme", "industry");
        let store = FileStore::open(sub.join("hints.json")).unwrap();
        store.set(&key, "finance").unwrap();

        // A plain file where the directory should be makes every write fail
        std::fs::remove_dir_all(&sub).unwrap();
        std::fs::write(&sub, "").unwrap();

        assert!(store.set(&key, "retail").is_err());
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("finance"));
        assert!(store.remove(&key).is_err());
        assert_eq!(store.get(&key).unwrap().as_deref(), Some("finance"));
    }

    #[test]
    fn file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hints.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(FileStore::open(&path), Err(StoreError::Corrupt(_))));
    }
}
