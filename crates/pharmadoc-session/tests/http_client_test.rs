//! `HttpAuthClient` against an in-process axum backend.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Form;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;

use pharmadoc_core::config::{ApiConfig, SessionConfig};
use pharmadoc_core::error::ErrorKind;
use pharmadoc_core::types::TokenPair;
use pharmadoc_session::{
    AuthApi, HttpAuthClient, ManualClock, RefreshOutcome, SessionBus, SessionManager,
};
use pharmadoc_store::{MemoryTokenStore, SessionStorage};

async fn refresh_handler(Form(form): Form<HashMap<String, String>>) -> Response {
    match form.get("refresh_token").map(String::as_str) {
        Some("abc") => Json(json!({
            "access_token": "A2",
            "refresh_token": "R2",
            "token_type": "bearer"
        }))
        .into_response(),
        Some("keep") => Json(json!({ "access_token": "A3" })).into_response(),
        Some("bad-json") => (StatusCode::OK, "<html>maintenance</html>").into_response(),
        Some("boom") => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "Database unavailable" })),
        )
            .into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Invalid refresh token" })),
        )
            .into_response(),
    }
}

async fn profile_handler(headers: HeaderMap) -> Response {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == "Bearer A2" || v == "Bearer A1");
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Could not validate credentials" })),
        )
            .into_response();
    }

    Json(json!({
        "id": 7,
        "username": "qa.reviewer",
        "role": "admin",
        "email": "qa@example.com",
        "is_active": true
    }))
    .into_response()
}

async fn login_handler(Form(form): Form<HashMap<String, String>>) -> Response {
    let username = form.get("username").map(String::as_str);
    let password = form.get("password").map(String::as_str);
    if username == Some("qa.reviewer") && password == Some("s3cret") {
        Json(json!({
            "access_token": "A1",
            "refresh_token": "abc",
            "token_type": "bearer"
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Incorrect username or password" })),
        )
            .into_response()
    }
}

/// Serve the auth routes on an ephemeral port and return the base URL.
async fn spawn_backend() -> String {
    let app = Router::new()
        .route("/api/auth/refresh-token", post(refresh_handler))
        .route("/api/auth/profile", get(profile_handler))
        .route("/api/auth/login", post(login_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn client(base_url: &str) -> HttpAuthClient {
    HttpAuthClient::new(&ApiConfig {
        base_url: base_url.to_string(),
        request_timeout_seconds: Some(5),
        ..ApiConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_refresh_returns_rotated_pair() {
    let api = client(&spawn_backend().await);

    let response = api.refresh("abc").await.unwrap();
    assert_eq!(response.access_token, "A2");
    assert_eq!(response.refresh_token.as_deref(), Some("R2"));
}

#[tokio::test]
async fn test_refresh_without_rotation() {
    let api = client(&spawn_backend().await);

    let response = api.refresh("keep").await.unwrap();
    assert_eq!(response.access_token, "A3");
    assert!(response.refresh_token.is_none());
}

#[tokio::test]
async fn test_refresh_rejected_is_authentication_error() {
    let api = client(&spawn_backend().await);

    let err = api.refresh("expired").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert!(err.message.contains("Invalid refresh token"));
}

#[tokio::test]
async fn test_server_error_is_external_service_error() {
    let api = client(&spawn_backend().await);

    let err = api.refresh("boom").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExternalService);
    assert!(err.message.contains("Database unavailable"));
}

#[tokio::test]
async fn test_malformed_body_is_serialization_error() {
    let api = client(&spawn_backend().await);

    let err = api.refresh("bad-json").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Serialization);
}

#[tokio::test]
async fn test_unreachable_backend_is_external_service_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = client(&format!("http://{addr}"));
    let err = api.refresh("abc").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExternalService);
}

#[tokio::test]
async fn test_profile_sends_bearer_token() {
    let api = client(&spawn_backend().await);

    let profile = api.profile("A2").await.unwrap();
    assert_eq!(profile.username, "qa.reviewer");
    assert_eq!(profile.id_display(), "7");
    assert_eq!(profile.role.as_deref(), Some("admin"));

    let err = api.profile("stale").await.unwrap_err();
    assert!(err.is_authentication());
}

#[tokio::test]
async fn test_login_with_form_credentials() {
    let api = client(&format!("{}/", spawn_backend().await));

    let pair = TokenPair::from(api.login("qa.reviewer", "s3cret").await.unwrap());
    assert_eq!(pair, TokenPair::new("A1", "abc"));

    let err = api.login("qa.reviewer", "wrong").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
}

async fn manager_over_http(seed: TokenPair) -> (SessionManager, SessionStorage) {
    let base_url = spawn_backend().await;
    let storage = SessionStorage::new(Arc::new(MemoryTokenStore::new()));
    storage.replace_tokens(&seed).await.unwrap();

    let manager = SessionManager::new(
        SessionConfig::default(),
        storage.clone(),
        Arc::new(client(&base_url)),
        Arc::new(ManualClock::new(Utc::now())),
        SessionBus::default(),
    );
    (manager, storage)
}

#[tokio::test]
async fn test_manager_refresh_end_to_end() {
    let (manager, storage) = manager_over_http(TokenPair::new("A1", "abc")).await;

    assert_eq!(manager.refresh().await, RefreshOutcome::Refreshed);

    assert_eq!(
        storage.tokens().await.unwrap(),
        Some(TokenPair::new("A2", "R2"))
    );
    let cached = storage.profile().await.unwrap().unwrap();
    assert_eq!(cached.username, "qa.reviewer");
}

#[tokio::test]
async fn test_manager_keeps_tokens_on_rejection() {
    let (manager, storage) = manager_over_http(TokenPair::new("A1", "revoked")).await;

    assert_eq!(manager.refresh().await, RefreshOutcome::Failed);

    assert_eq!(
        storage.tokens().await.unwrap(),
        Some(TokenPair::new("A1", "revoked"))
    );
    assert!(storage.profile().await.unwrap().is_none());
}
