//! Backend REST API configuration.

use serde::{Deserialize, Serialize};

/// Where and how to reach the document-intelligence backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend, without a trailing `/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds. `None` keeps the transport default.
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: None,
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_user_agent() -> String {
    format!("pharmadoc/{}", env!("CARGO_PKG_VERSION"))
}
