//! Cached copy of the server-side user identity.

use serde::{Deserialize, Serialize};

/// User profile as returned by `GET /api/auth/profile`.
///
/// Stored under `user_data` purely to avoid a round trip on start-up;
/// replaced wholesale whenever the profile endpoint is queried again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Server-side user ID.
    pub id: serde_json::Value,
    /// Login name.
    pub username: String,
    /// Role name (`admin`, `user`, ...).
    #[serde(default)]
    pub role: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the account is enabled.
    #[serde(default = "default_active", alias = "active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl UserProfile {
    /// Render the ID without JSON quoting.
    pub fn id_display(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
