//! Token pair and auth endpoint payloads.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The current access/refresh pair.
///
/// Always written and replaced as a unit; never update one half alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Long-lived token exchanged for a new pair.
    pub refresh_token: String,
}

impl TokenPair {
    /// Create a new pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Build the pair that replaces `current_refresh` after a successful
    /// refresh. The server may omit `refresh_token`; the old one is kept then.
    pub fn merge_refresh(response: RefreshResponse, current_refresh: &str) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .unwrap_or_else(|| current_refresh.to_string()),
        }
    }
}

/// Body of a successful `POST /api/auth/refresh-token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// Newly issued access token.
    pub access_token: String,
    /// Rotated refresh token, if the server rotates them.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Body of a successful `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl From<LoginResponse> for TokenPair {
    fn from(response: LoginResponse) -> Self {
        Self::new(response.access_token, response.refresh_token)
    }
}

/// Read the `exp` claim of a JWT without verifying its signature.
///
/// Display only. Returns `None` for anything that is not a three-part
/// token with a numeric `exp` in its payload.
pub fn peek_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut parts = token.split('.');
    let (_, payload, _) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}
