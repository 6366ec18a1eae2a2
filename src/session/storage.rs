// src/session/storage.rs — Durable key-value storage for the session record
//
// A tiny string-to-string store that survives process restarts, the
// way browser local storage survives reloads. The file backend keeps
// one JSON object on disk and rewrites it atomically on every change.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;

use crate::infra::errors::NekotaError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DurableStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, NekotaError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), NekotaError>;
    async fn remove(&self, key: &str) -> Result<(), NekotaError>;
}

// ─── File backend ───────────────────────────────────────────────────────────

/// JSON-file backed storage.
///
/// # Security Note
/// The bearer token is stored as plaintext JSON (chmod 600 on Unix),
/// the same trade-off browser local storage makes.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles so concurrent writers never
    // clobber each other's keys.
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, NekotaError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            NekotaError::StorageCorrupt(format!("{}: {e}", self.path.display()))
        })
    }

    /// Atomic write: temp file, chmod 600, rename.
    async fn save(&self, map: &HashMap<String, String>) -> Result<(), NekotaError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| NekotaError::Storage(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
                .await?;
        }

        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    /// Loads for modification. A corrupt file is replaced rather than
    /// blocking every future write; the flag reports that it must be
    /// rewritten even if nothing else changes.
    async fn load_for_write(&self) -> Result<(HashMap<String, String>, bool), NekotaError> {
        match self.load().await {
            Err(NekotaError::StorageCorrupt(msg)) => {
                tracing::warn!(path = %self.path.display(), "Discarding corrupt storage file: {msg}");
                Ok((HashMap::new(), true))
            }
            other => other.map(|map| (map, false)),
        }
    }
}

#[async_trait]
impl DurableStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, NekotaError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), NekotaError> {
        let _guard = self.lock.lock().await;
        let (mut map, _) = self.load_for_write().await?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), NekotaError> {
        let _guard = self.lock.lock().await;
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(());
        }
        let (mut map, corrupt) = self.load_for_write().await?;
        if map.remove(key).is_none() && !corrupt {
            return Ok(());
        }
        self.save(&map).await
    }
}

// ─── In-memory backend ──────────────────────────────────────────────────────

/// Process-local storage. Used by tests and `--ephemeral` runs.
#[derive(Default)]
pub struct MemoryStorage {
    entries: StdMutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without going through the async API.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|e| e.contains_key(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> NekotaError {
    NekotaError::Storage("memory storage lock poisoned".into())
}

#[async_trait]
impl DurableStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, NekotaError> {
        Ok(self.entries.lock().map_err(|_| poisoned())?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), NekotaError> {
        self.entries
            .lock()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), NekotaError> {
        self.entries.lock().map_err(|_| poisoned())?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_storage_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("storage.json"));
        assert_eq!(storage.get("token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_storage_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let storage = FileStorage::new(&path);
        storage.set("token", "abc").await.unwrap();
        storage.set("user", r#"{"id":"u1"}"#).await.unwrap();
        drop(storage);

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("abc"));
        assert_eq!(
            reopened.get("user").await.unwrap().as_deref(),
            Some(r#"{"id":"u1"}"#)
        );
    }

    #[tokio::test]
    async fn test_file_storage_remove() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("storage.json"));
        storage.set("token", "abc").await.unwrap();
        storage.set("other", "keep").await.unwrap();
        storage.remove("token").await.unwrap();
        storage.remove("token").await.unwrap();

        assert_eq!(storage.get("token").await.unwrap(), None);
        assert_eq!(storage.get("other").await.unwrap().as_deref(), Some("keep"));
    }

    #[tokio::test]
    async fn test_file_storage_remove_without_file_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let storage = FileStorage::new(&path);
        storage.remove("token").await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_file_storage_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get("token").await,
            Err(NekotaError::StorageCorrupt(_))
        ));

        // Removal rewrites the corrupt file as an empty record
        storage.remove("user").await.unwrap();
        assert_eq!(storage.get("token").await.unwrap(), None);

        std::fs::write(&path, "{not json").unwrap();
        storage.set("token", "abc").await.unwrap();
        assert_eq!(storage.get("token").await.unwrap().as_deref(), Some("abc"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_storage_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let storage = FileStorage::new(&path);
        storage.set("token", "abc").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_memory_storage_basic() {
        let storage = MemoryStorage::new().with_entry("token", "abc");
        assert!(storage.contains("token"));
        assert_eq!(storage.get("token").await.unwrap().as_deref(), Some("abc"));
        storage.remove("token").await.unwrap();
        assert!(storage.is_empty());
    }
}
