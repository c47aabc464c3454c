//! Auth endpoints of the document-intelligence backend.

pub mod http;

use async_trait::async_trait;

use pharmadoc_core::result::AppResult;
use pharmadoc_core::types::{LoginResponse, RefreshResponse, UserProfile};

pub use http::HttpAuthClient;

/// Auth calls a session needs.
///
/// Implementations report a rejected credential as an
/// [`Authentication`](pharmadoc_core::error::ErrorKind::Authentication)
/// error and everything else (transport, non-2xx, malformed body) under
/// its own kind; callers decide which of those are fatal.
#[async_trait]
pub trait AuthApi: Send + Sync + std::fmt::Debug + 'static {
    /// Exchange a refresh token for a new pair.
    async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshResponse>;

    /// Fetch the profile of the user owning `access_token`.
    async fn profile(&self, access_token: &str) -> AppResult<UserProfile>;

    /// Obtain a pair with username and password.
    async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse>;
}
