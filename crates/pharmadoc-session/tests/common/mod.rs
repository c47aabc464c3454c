//! Shared fixtures for session integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::{Notify, broadcast};

use pharmadoc_core::config::SessionConfig;
use pharmadoc_core::error::AppError;
use pharmadoc_core::events::EventEnvelope;
use pharmadoc_core::result::AppResult;
use pharmadoc_core::traits::TokenStore;
use pharmadoc_core::types::{LoginResponse, RefreshResponse, TokenPair, UserProfile};
use pharmadoc_session::{AuthApi, Clock, ManualClock, SessionBus, SessionManager};
use pharmadoc_store::{MemoryTokenStore, SessionStorage};

/// How the fake backend answers refresh requests.
#[derive(Debug, Clone)]
pub enum RefreshMode {
    /// Each call issues `A{n}` / `R{n}`.
    Rotate,
    /// Always answer with this body.
    Fixed(RefreshResponse),
    /// HTTP 401.
    Reject,
}

/// Scripted [`AuthApi`] that records every call.
#[derive(Debug)]
pub struct FakeAuthApi {
    mode: Mutex<RefreshMode>,
    refresh_calls: Mutex<Vec<String>>,
    profile_calls: AtomicUsize,
    hold: Mutex<Option<Arc<Notify>>>,
}

impl FakeAuthApi {
    pub fn new(mode: RefreshMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            refresh_calls: Mutex::new(Vec::new()),
            profile_calls: AtomicUsize::new(0),
            hold: Mutex::new(None),
        }
    }

    pub fn set_mode(&self, mode: RefreshMode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Refresh tokens sent so far, in order.
    pub fn refresh_calls(&self) -> Vec<String> {
        self.refresh_calls.lock().unwrap().clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.lock().unwrap().len()
    }

    /// Park every later refresh call until the returned gate is notified.
    pub fn hold_refreshes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn profile_count(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshResponse> {
        let n = {
            let mut calls = self.refresh_calls.lock().unwrap();
            calls.push(refresh_token.to_string());
            calls.len()
        };

        let gate = self.hold.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        match self.mode.lock().unwrap().clone() {
            RefreshMode::Rotate => Ok(RefreshResponse {
                access_token: format!("A{}", n + 1),
                refresh_token: Some(format!("R{}", n + 1)),
            }),
            RefreshMode::Fixed(response) => Ok(response),
            RefreshMode::Reject => Err(AppError::authentication(
                "/api/auth/refresh-token returned 401 Unauthorized: Invalid refresh token",
            )),
        }
    }

    async fn profile(&self, _access_token: &str) -> AppResult<UserProfile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        Ok(profile())
    }

    async fn login(&self, username: &str, _password: &str) -> AppResult<LoginResponse> {
        Ok(LoginResponse {
            access_token: format!("access-{username}"),
            refresh_token: format!("refresh-{username}"),
            token_type: "bearer".to_string(),
        })
    }
}

pub fn profile() -> UserProfile {
    UserProfile {
        id: serde_json::json!(42),
        username: "regulatory.analyst".to_string(),
        role: Some("user".to_string()),
        email: Some("analyst@example.com".to_string()),
        is_active: true,
    }
}

/// Monday morning, so timestamps in failures read naturally.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
}

pub fn hours(n: u64) -> Duration {
    Duration::from_secs(n * 3600)
}

pub fn minutes(n: u64) -> Duration {
    Duration::from_secs(n * 60)
}

/// A manager wired to fakes, sharing clock, bus, and storage with any siblings.
pub struct Harness {
    pub manager: Arc<SessionManager>,
    pub clock: ManualClock,
    pub api: Arc<FakeAuthApi>,
    pub backend: MemoryTokenStore,
    pub storage: SessionStorage,
    pub bus: SessionBus,
    pub config: SessionConfig,
}

impl Harness {
    /// Default config, storage seeded with `A1` / `abc`.
    pub async fn new(mode: RefreshMode) -> Self {
        Self::with_config(mode, SessionConfig::default()).await
    }

    pub async fn with_config(mode: RefreshMode, config: SessionConfig) -> Self {
        let clock = ManualClock::new(start_time());
        let api = Arc::new(FakeAuthApi::new(mode));
        let backend = MemoryTokenStore::new();
        let storage = SessionStorage::new(Arc::new(backend.clone()));
        storage
            .replace_tokens(&TokenPair::new("A1", "abc"))
            .await
            .unwrap();
        let bus = SessionBus::default();

        let manager = Arc::new(SessionManager::new(
            config.clone(),
            storage.clone(),
            api.clone(),
            Arc::new(clock.clone()),
            bus.clone(),
        ));

        Self {
            manager,
            clock,
            api,
            backend,
            storage,
            bus,
            config,
        }
    }

    /// A second, independent manager over the same storage, clock, and bus.
    pub fn sibling(&self) -> Arc<SessionManager> {
        Arc::new(SessionManager::new(
            self.config.clone(),
            self.storage.clone(),
            self.api.clone(),
            Arc::new(self.clock.clone()),
            self.bus.clone(),
        ))
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn stored(&self, key: &str) -> Option<String> {
        self.backend.get(key).await.unwrap()
    }

    pub async fn backend_keys(&self) -> Vec<String> {
        self.backend.keys().await.unwrap()
    }
}

/// Everything currently queued on a receiver.
pub fn drain(rx: &mut broadcast::Receiver<EventEnvelope>) -> Vec<EventEnvelope> {
    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope);
    }
    events
}
