//! In-memory token store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use pharmadoc_core::result::AppResult;
use pharmadoc_core::traits::TokenStore;

/// Process-local token store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryTokenStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()> {
        let mut map = self.entries.write().await;
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    async fn set_many_if(
        &self,
        guard: (&str, &str),
        entries: &[(&str, &str)],
    ) -> AppResult<bool> {
        let mut map = self.entries.write().await;
        if map.get(guard.0).map(String::as_str) != Some(guard.1) {
            return Ok(false);
        }
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(true)
    }

    async fn delete_many(&self, keys: &[&str]) -> AppResult<()> {
        let mut map = self.entries.write().await;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
