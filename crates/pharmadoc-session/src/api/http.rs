//! `reqwest`-backed [`AuthApi`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use pharmadoc_core::config::ApiConfig;
use pharmadoc_core::error::{AppError, ErrorKind};
use pharmadoc_core::result::AppResult;
use pharmadoc_core::types::{LoginResponse, RefreshResponse, UserProfile};

use super::AuthApi;

const REFRESH_PATH: &str = "/api/auth/refresh-token";
const PROFILE_PATH: &str = "/api/auth/profile";
const LOGIN_PATH: &str = "/api/auth/login";

/// HTTP client for the backend's `/api/auth/*` endpoints.
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpAuthClient {
    /// Build a client from configuration. Without a configured timeout the
    /// transport default applies.
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(seconds) = config.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        let http = builder.build().map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Failed to build HTTP client: {e}"),
                e,
            )
        })?;

        Ok(Self::with_client(&config.base_url, http))
    }

    /// Use an existing `reqwest::Client`.
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> AppResult<T> {
        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Request to {path} failed: {e}"),
                e,
            )
        })?;

        let status = response.status();
        debug!(
            path,
            status = status.as_u16(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Auth API responded"
        );

        let body = response.bytes().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Failed to read response from {path}: {e}"),
                e,
            )
        })?;

        if !status.is_success() {
            let detail = error_detail(&body);
            warn!(path, status = status.as_u16(), detail = %detail, "Auth API rejected request");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    AppError::authentication(format!("{path} returned {status}: {detail}"))
                }
                _ => AppError::external_service(format!("{path} returned {status}: {detail}")),
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            AppError::with_source(
                ErrorKind::Serialization,
                format!("Malformed response from {path}: {e}"),
                e,
            )
        })
    }
}

/// FastAPI-style `{"detail": ...}` if present, else the raw body.
fn error_detail(body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        "no details".to_string()
    } else {
        text.chars().take(200).collect()
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshResponse> {
        let request = self
            .http
            .post(self.url(REFRESH_PATH))
            .form(&[("refresh_token", refresh_token)]);
        self.send(request, REFRESH_PATH).await
    }

    async fn profile(&self, access_token: &str) -> AppResult<UserProfile> {
        let request = self
            .http
            .get(self.url(PROFILE_PATH))
            .bearer_auth(access_token);
        self.send(request, PROFILE_PATH).await
    }

    async fn login(&self, username: &str, password: &str) -> AppResult<LoginResponse> {
        let request = self
            .http
            .post(self.url(LOGIN_PATH))
            .form(&[("username", username), ("password", password)]);
        self.send(request, LOGIN_PATH).await
    }
}
