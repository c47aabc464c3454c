//! Client-side token storage for PharmaDoc.
//!
//! - [`MemoryTokenStore`] keeps everything in process memory
//! - [`FileTokenStore`] persists to a JSON file with all-or-nothing writes
//! - [`SessionStorage`] is the typed view over either backend

pub mod file;
pub mod memory;
pub mod storage;

use std::sync::Arc;

use pharmadoc_core::config::{StorageBackend, StorageConfig};
use pharmadoc_core::result::AppResult;
use pharmadoc_core::traits::TokenStore;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;
pub use storage::SessionStorage;

/// Open the backend selected in configuration.
pub async fn open_store(config: &StorageConfig) -> AppResult<Arc<dyn TokenStore>> {
    let store: Arc<dyn TokenStore> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryTokenStore::new()),
        StorageBackend::File => Arc::new(FileTokenStore::open(&config.path).await?),
    };
    tracing::debug!(backend = %config.backend, "Token store opened");
    Ok(store)
}
