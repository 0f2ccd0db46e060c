//! Durable string-keyed storage backing the session.
//!
//! Backends behave like browser local storage: a flat map of string keys to
//! string values. Multi-key writes and removals are atomic per backend, which
//! is what lets `SessionStore` keep the token and identity in step.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode storage contents: {0}")]
    Encode(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key/value storage abstraction.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Read the value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Read all `keys` from one snapshot, in order.
    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError>;

    /// Write all `entries` in one step.
    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;

    /// Remove all `keys` in one step. Missing keys are ignored.
    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;
}

/// In-process storage; contents are lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let map = self.lock()?;
        Ok(keys.iter().map(|key| map.get(*key).cloned()).collect())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut map = self.lock()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut map = self.lock()?;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// Storage persisted as a single JSON object file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so readers see either the old or the new contents.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "storage file is not a JSON object; treating it as empty"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    async fn write_all(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }

        let payload =
            serde_json::to_vec_pretty(map).map_err(|e| StorageError::Encode(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, payload).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        let mut map = self.read_all().await?;
        Ok(keys.iter().map(|key| map.remove(*key)).collect())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        self.write_all(&map).await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_all().await?;
        let before = map.len();
        for key in keys {
            map.remove(*key);
        }
        if map.len() == before && !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }
        self.write_all(&map).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();
        storage.set_many(&[("a", "1"), ("b", "2")]).await.unwrap();

        assert_eq!(storage.get("a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(storage.get("b").await.unwrap().as_deref(), Some("2"));

        storage.remove_many(&["a", "b", "missing"]).await.unwrap();
        assert_eq!(storage.get("a").await.unwrap(), None);
        assert_eq!(storage.get("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileStorage::new(&path)
            .set_many(&[("token", "abc")])
            .await
            .unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("abc"));

        reopened.remove_many(&["token"]).await.unwrap();
        assert_eq!(FileStorage::new(&path).get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_many_reads_keys_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileStorage::new(dir.path().join("session.json"));
        let memory = MemoryStorage::new();

        let backends: [&dyn SessionStorage; 2] = [&file, &memory];
        for storage in backends {
            storage.set_many(&[("token", "abc"), ("user", "{}")]).await.unwrap();
            assert_eq!(
                storage.get_many(&["user", "missing", "token"]).await.unwrap(),
                vec![Some("{}".to_string()), None, Some("abc".to_string())]
            );
        }
    }

    #[tokio::test]
    async fn file_storage_missing_file_is_empty_and_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("session.json"));

        assert_eq!(storage.get("token").await.unwrap(), None);
        storage.remove_many(&["token", "user"]).await.unwrap();
        storage.remove_many(&["token", "user"]).await.unwrap();
        assert!(!storage.path().exists());
    }

    #[tokio::test]
    async fn file_storage_recovers_from_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json at all").unwrap();

        let storage = FileStorage::new(&path);
        assert_eq!(storage.get("token").await.unwrap(), None);

        storage.set_many(&[("token", "xyz")]).await.unwrap();
        assert_eq!(storage.get("token").await.unwrap().as_deref(), Some("xyz"));
    }
}
