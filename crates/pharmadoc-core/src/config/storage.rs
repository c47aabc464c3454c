//! Client-side token storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which backend persists the token pair and cached profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local map, lost on exit.
    Memory,
    /// JSON file on disk.
    File,
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::File
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::File => write!(f, "file"),
        }
    }
}

/// Token storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Path of the JSON file used by the `file` backend.
    #[serde(default = "default_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_path(),
        }
    }
}

/// `~/.config/pharmadoc/session.json` on Linux, the platform config dir
/// elsewhere, and a relative `.pharmadoc/session.json` as a last resort.
fn default_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("pharmadoc").join("session.json"),
        None => PathBuf::from(".pharmadoc").join("session.json"),
    }
}
