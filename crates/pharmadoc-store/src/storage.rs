//! Typed session view over a [`TokenStore`].

use std::sync::Arc;

use tracing::warn;

use pharmadoc_core::result::AppResult;
use pharmadoc_core::traits::TokenStore;
use pharmadoc_core::types::{RefreshResponse, StorageKey, TokenPair, UserProfile};

/// Reads and writes the persisted session keys.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    store: Arc<dyn TokenStore>,
}

impl SessionStorage {
    /// Wrap a backend.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub async fn access_token(&self) -> AppResult<Option<String>> {
        self.store.get(StorageKey::AccessToken.as_str()).await
    }

    pub async fn refresh_token(&self) -> AppResult<Option<String>> {
        self.store.get(StorageKey::RefreshToken.as_str()).await
    }

    /// The stored pair, if both halves are present.
    pub async fn tokens(&self) -> AppResult<Option<TokenPair>> {
        let access = self.access_token().await?;
        let refresh = self.refresh_token().await?;
        Ok(match (access, refresh) {
            (Some(access), Some(refresh)) => Some(TokenPair::new(access, refresh)),
            _ => None,
        })
    }

    /// Overwrite both tokens in a single write.
    pub async fn replace_tokens(&self, pair: &TokenPair) -> AppResult<()> {
        self.store
            .set_many(&[
                (StorageKey::AccessToken.as_str(), pair.access_token.as_str()),
                (StorageKey::RefreshToken.as_str(), pair.refresh_token.as_str()),
            ])
            .await
    }

    /// Store the pair produced by a refresh that was issued with
    /// `used_refresh_token`, and return it.
    ///
    /// Returns `None` without writing when the stored refresh token is no
    /// longer `used_refresh_token` (cleared by a logout, or rotated by
    /// another instance while the request was in flight).
    pub async fn apply_refresh(
        &self,
        response: RefreshResponse,
        used_refresh_token: &str,
    ) -> AppResult<Option<TokenPair>> {
        let pair = TokenPair::merge_refresh(response, used_refresh_token);
        let written = self
            .store
            .set_many_if(
                (StorageKey::RefreshToken.as_str(), used_refresh_token),
                &[
                    (StorageKey::AccessToken.as_str(), pair.access_token.as_str()),
                    (StorageKey::RefreshToken.as_str(), pair.refresh_token.as_str()),
                ],
            )
            .await?;
        Ok(written.then_some(pair))
    }

    /// The cached profile. A value that no longer parses is treated as absent.
    pub async fn profile(&self) -> AppResult<Option<UserProfile>> {
        let Some(raw) = self.store.get(StorageKey::UserData.as_str()).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cached user profile");
                Ok(None)
            }
        }
    }

    pub async fn set_profile(&self, profile: &UserProfile) -> AppResult<()> {
        let json = serde_json::to_string(profile)?;
        self.store.set(StorageKey::UserData.as_str(), &json).await
    }

    /// Cache `profile` only while `access_token` is still the stored one.
    pub async fn set_profile_for(
        &self,
        access_token: &str,
        profile: &UserProfile,
    ) -> AppResult<bool> {
        let json = serde_json::to_string(profile)?;
        self.store
            .set_many_if(
                (StorageKey::AccessToken.as_str(), access_token),
                &[(StorageKey::UserData.as_str(), json.as_str())],
            )
            .await
    }

    /// Remove tokens and profile.
    pub async fn clear(&self) -> AppResult<()> {
        let keys: Vec<&str> = StorageKey::ALL.iter().map(|k| k.as_str()).collect();
        self.store.delete_many(&keys).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTokenStore;

    fn storage() -> (SessionStorage, MemoryTokenStore) {
        let backend = MemoryTokenStore::new();
        (SessionStorage::new(Arc::new(backend.clone())), backend)
    }

    fn profile() -> UserProfile {
        UserProfile {
            id: serde_json::json!(7),
            username: "qa.reviewer".to_string(),
            role: Some("admin".to_string()),
            email: Some("qa@example.com".to_string()),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_tokens_require_both_halves() {
        let (storage, backend) = storage();
        backend.set("access_token", "A1").await.unwrap();
        assert!(storage.tokens().await.unwrap().is_none());

        backend.set("refresh_token", "R1").await.unwrap();
        assert_eq!(
            storage.tokens().await.unwrap(),
            Some(TokenPair::new("A1", "R1"))
        );
    }

    #[tokio::test]
    async fn test_apply_refresh_rotates_pair() {
        let (storage, _) = storage();
        storage
            .replace_tokens(&TokenPair::new("A1", "abc"))
            .await
            .unwrap();

        let pair = storage
            .apply_refresh(
                RefreshResponse {
                    access_token: "A2".to_string(),
                    refresh_token: Some("R2".to_string()),
                },
                "abc",
            )
            .await
            .unwrap();

        assert_eq!(pair, Some(TokenPair::new("A2", "R2")));
        assert_eq!(storage.access_token().await.unwrap().as_deref(), Some("A2"));
        assert_eq!(storage.refresh_token().await.unwrap().as_deref(), Some("R2"));
    }

    #[tokio::test]
    async fn test_apply_refresh_keeps_refresh_token_when_omitted() {
        let (storage, _) = storage();
        storage
            .replace_tokens(&TokenPair::new("A1", "abc"))
            .await
            .unwrap();

        storage
            .apply_refresh(
                RefreshResponse {
                    access_token: "A2".to_string(),
                    refresh_token: None,
                },
                "abc",
            )
            .await
            .unwrap();

        assert_eq!(
            storage.tokens().await.unwrap(),
            Some(TokenPair::new("A2", "abc"))
        );
    }

    #[tokio::test]
    async fn test_apply_refresh_after_clear_writes_nothing() {
        let (storage, backend) = storage();
        storage
            .replace_tokens(&TokenPair::new("A1", "abc"))
            .await
            .unwrap();
        storage.clear().await.unwrap();

        let pair = storage
            .apply_refresh(
                RefreshResponse {
                    access_token: "A2".to_string(),
                    refresh_token: Some("R2".to_string()),
                },
                "abc",
            )
            .await
            .unwrap();

        assert!(pair.is_none());
        assert!(backend.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_apply_refresh_after_rotation_elsewhere() {
        let (storage, _) = storage();
        storage
            .replace_tokens(&TokenPair::new("A5", "R5"))
            .await
            .unwrap();

        let pair = storage
            .apply_refresh(
                RefreshResponse {
                    access_token: "A2".to_string(),
                    refresh_token: Some("R2".to_string()),
                },
                "abc",
            )
            .await
            .unwrap();

        assert!(pair.is_none());
        assert_eq!(
            storage.tokens().await.unwrap(),
            Some(TokenPair::new("A5", "R5"))
        );
    }

    #[tokio::test]
    async fn test_profile_only_cached_for_current_token() {
        let (storage, _) = storage();
        storage
            .replace_tokens(&TokenPair::new("A2", "R2"))
            .await
            .unwrap();

        assert!(!storage.set_profile_for("A1", &profile()).await.unwrap());
        assert!(storage.profile().await.unwrap().is_none());

        assert!(storage.set_profile_for("A2", &profile()).await.unwrap());
        assert_eq!(storage.profile().await.unwrap(), Some(profile()));
    }

    #[tokio::test]
    async fn test_profile_roundtrip_and_clear() {
        let (storage, backend) = storage();
        storage
            .replace_tokens(&TokenPair::new("A1", "R1"))
            .await
            .unwrap();
        storage.set_profile(&profile()).await.unwrap();
        assert_eq!(storage.profile().await.unwrap(), Some(profile()));

        storage.clear().await.unwrap();
        assert!(backend.keys().await.unwrap().is_empty());
        assert!(storage.profile().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_profile_is_absent() {
        let (storage, backend) = storage();
        backend.set("user_data", "{broken").await.unwrap();
        assert!(storage.profile().await.unwrap().is_none());
    }
}
