//! JSON-file token store.
//!
//! The file holds one flat JSON object:
//!
//! ```json
//! {
//!   "access_token": "eyJhbGciOiJIUzI1NiIs...",
//!   "refresh_token": "eyJhbGciOiJIUzI1NiIs...",
//!   "user_data": "{\"id\":7,\"username\":\"qa.reviewer\"}"
//! }
//! ```
//!
//! Every mutation rewrites the whole object to a sibling temp file and
//! renames it over the original, so a pair replacement lands completely
//! or not at all. On Unix the file is created with mode `0600`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use pharmadoc_core::error::{AppError, ErrorKind};
use pharmadoc_core::result::AppResult;
use pharmadoc_core::traits::TokenStore;

/// Token store persisted to a JSON file, with an in-memory copy for reads.
#[derive(Debug)]
pub struct FileTokenStore {
    /// Path to the JSON file.
    path: PathBuf,
    /// Last state successfully written to (or read from) disk.
    cache: RwLock<BTreeMap<String, String>>,
}

impl FileTokenStore {
    /// Open the store at `path`, loading existing contents.
    ///
    /// A missing file is an empty store. A file that is not a JSON object
    /// of strings is reported as a storage error rather than overwritten.
    pub async fn open(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Session file is corrupt: {}", path.display()),
                    e,
                )
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read session file: {}", path.display()),
                    e,
                ));
            }
        };

        debug!(path = %path.display(), keys = entries.len(), "Loaded session file");

        Ok(Self {
            path,
            cache: RwLock::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `mutate` to a copy of the current map, persist it, then
    /// publish it. The in-memory copy is untouched if the write fails.
    async fn update<T, F>(&self, mutate: F) -> AppResult<T>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> T,
    {
        let mut cache = self.cache.write().await;
        let mut next = cache.clone();
        let outcome = mutate(&mut next);

        if next != *cache {
            self.persist(&next).await?;
            *cache = next;
        }
        Ok(outcome)
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to create directory: {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let json = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");

        fs::write(&tmp, &json).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to write session file: {}", tmp.display()),
                e,
            )
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await
            {
                warn!(path = %tmp.display(), error = %e, "Failed to restrict session file permissions");
            }
        }

        fs::rename(&tmp, &self.path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to replace session file: {}", self.path.display()),
                e,
            )
        })?;

        debug!(path = %self.path.display(), keys = entries.len(), "Wrote session file");
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.update(|map| {
            map.remove(key);
        })
        .await
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()> {
        self.update(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), (*value).to_string());
            }
        })
        .await
    }

    async fn set_many_if(
        &self,
        guard: (&str, &str),
        entries: &[(&str, &str)],
    ) -> AppResult<bool> {
        self.update(|map| {
            if map.get(guard.0).map(String::as_str) != Some(guard.1) {
                return false;
            }
            for (key, value) in entries {
                map.insert((*key).to_string(), (*value).to_string());
            }
            true
        })
        .await
    }

    async fn delete_many(&self, keys: &[&str]) -> AppResult<()> {
        self.update(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
        .await
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        Ok(self.cache.read().await.keys().cloned().collect())
    }
}
