// ABOUTME: Durable key/value storage backing the session store
// ABOUTME: File-per-key storage for real use and an in-memory map for tests and ephemeral sessions

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, error};

use crate::error::{AuthError, AuthResult};

/// Client-persistent storage with named entries.
///
/// The session store keeps exactly two entries here: the token and the
/// serialized profile.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> AuthResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> AuthResult<()>;
    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> AuthResult<()>;
}

/// Stores each entry as a file named after its key
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> AuthResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AuthError::Storage(format!("Invalid storage key: {}", key)));
        }
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => {
                error!("Failed to read storage entry {}: {}", key, e);
                Err(AuthError::Storage(format!("Failed to read {}: {}", key, e)))
            }
        }
    }

    async fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        let path = self.entry_path(key)?;
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            AuthError::Storage(format!(
                "Failed to create storage dir {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        // Write to a sibling file and rename so readers never see a torn entry
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, value)
            .await
            .map_err(|e| AuthError::Storage(format!("Failed to write {}: {}", key, e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| AuthError::Storage(format!("Failed to persist {}: {}", key, e)))?;

        debug!("Persisted storage entry {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> AuthResult<()> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed storage entry {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(format!("Failed to remove {}: {}", key, e))),
        }
    }
}

/// Process-local storage; nothing survives a restart
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate entries, e.g. to simulate a previous process run
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AuthResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AuthResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}
