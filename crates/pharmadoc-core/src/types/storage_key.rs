//! Keys under which the session is persisted in client storage.

use std::fmt;

/// The three persisted session keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Bearer token sent with API requests.
    AccessToken,
    /// Token exchanged for a fresh pair.
    RefreshToken,
    /// JSON-serialized [`UserProfile`](super::UserProfile).
    UserData,
}

impl StorageKey {
    /// Every key, in the order they are cleared on logout.
    pub const ALL: [StorageKey; 3] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::UserData,
    ];

    /// The literal key name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AccessToken => "access_token",
            StorageKey::RefreshToken => "refresh_token",
            StorageKey::UserData => "user_data",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
