//! Client-side key-value storage trait.

use async_trait::async_trait;

use crate::result::AppResult;

/// Persistent string key-value storage for the session (the client's
/// equivalent of browser local storage).
///
/// Backends must make [`set_many`](TokenStore::set_many) and
/// [`delete_many`](TokenStore::delete_many) all-or-nothing: readers never
/// observe a new access token next to an old refresh token.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Set a single value.
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Atomically write several values.
    async fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()>;

    /// Atomically write several values, but only while `guard.0` still
    /// holds `guard.1`. Returns whether the write happened.
    async fn set_many_if(
        &self,
        guard: (&str, &str),
        entries: &[(&str, &str)],
    ) -> AppResult<bool>;

    /// Atomically delete several keys.
    async fn delete_many(&self, keys: &[&str]) -> AppResult<()>;

    /// List all stored keys.
    async fn keys(&self) -> AppResult<Vec<String>>;
}
