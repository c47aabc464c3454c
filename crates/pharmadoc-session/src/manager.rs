//! Session coordinator: activity, token refresh, and expiry warning.
//!
//! One [`SessionManager`] owns the session clock (last activity, session
//! start), a [`Scheduler`] of named timers, and the [`WarningDialog`].
//! Tokens live in shared [`SessionStorage`]; several managers may run
//! against the same storage and keep in step through the [`SessionBus`].
//!
//! Lifecycle:
//!
//! 1. `start()` resets the clock, schedules timers, registers listeners
//! 2. `tick()` is called by the owner's tick source and runs due timers
//! 3. `logout()` or expiry ends the session and cancels every timer
//! 4. `shutdown()` cancels timers and unregisters listeners

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use pharmadoc_core::config::SessionConfig;
use pharmadoc_core::error::AppError;
use pharmadoc_core::events::{EventEnvelope, LogoutReason, SessionEvent};
use pharmadoc_core::result::AppResult;
use pharmadoc_store::SessionStorage;

use crate::activity::{ActivityKind, ActivityTracker, Visibility};
use crate::api::AuthApi;
use crate::bus::SessionBus;
use crate::clock::Clock;
use crate::scheduler::{Scheduler, TimerName};
use crate::warning::{DialogState, WarningDialog};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Tokens are being kept fresh; no warning.
    Active,
    /// Remaining time is inside the warning window.
    WarningShown,
    /// Remaining time reached zero; storage was cleared.
    Expired,
    /// The user logged out.
    LoggedOut,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Expired | SessionPhase::LoggedOut)
    }
}

/// Input sources a mounted manager listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    Activity,
    Visibility,
    SessionEvents,
}

impl ListenerKind {
    const ALL: [ListenerKind; 3] = [
        ListenerKind::Activity,
        ListenerKind::Visibility,
        ListenerKind::SessionEvents,
    ];
}

/// Result of one refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// A new pair was stored.
    Refreshed,
    /// Nothing stored to refresh with; nothing was sent.
    NoRefreshToken,
    /// The request or the write failed; the previous pair is untouched.
    Failed,
}

impl std::fmt::Display for RefreshOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshOutcome::Refreshed => write!(f, "refreshed"),
            RefreshOutcome::NoRefreshToken => write!(f, "no_refresh_token"),
            RefreshOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// Read-only view of a manager's state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub mounted: bool,
    pub last_activity: DateTime<Utc>,
    pub session_start: DateTime<Utc>,
    pub last_refresh: DateTime<Utc>,
    /// Time left until the session boundary, zero once passed.
    pub remaining: Duration,
    pub dialog: DialogState,
    pub countdown_seconds: u64,
    pub timers: Vec<TimerName>,
    pub listeners: Vec<ListenerKind>,
}

impl SessionSnapshot {
    pub fn warning_visible(&self) -> bool {
        matches!(self.dialog, DialogState::Visible { .. })
    }
}

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    mounted: bool,
    activity: ActivityTracker,
    session_start: DateTime<Utc>,
    last_refresh: DateTime<Utc>,
    visibility: Visibility,
    scheduler: Scheduler,
    dialog: WarningDialog,
    listeners: BTreeSet<ListenerKind>,
}

impl SessionState {
    fn new(config: &SessionConfig, now: DateTime<Utc>) -> Self {
        Self {
            phase: SessionPhase::Active,
            mounted: false,
            activity: ActivityTracker::new(config.activity_throttle(), now),
            session_start: now,
            last_refresh: now,
            visibility: Visibility::Visible,
            scheduler: Scheduler::new(),
            dialog: WarningDialog::new(config.warning_window_seconds),
            listeners: BTreeSet::new(),
        }
    }

    fn listening(&self, kind: ListenerKind) -> bool {
        self.listeners.contains(&kind)
    }

    /// Back to a plain active session after an extension, wherever it came from.
    fn renew(&mut self, at: DateTime<Utc>) {
        self.session_start = at;
        self.activity.touch(at);
        self.dialog.hide();
        self.scheduler.cancel(TimerName::Countdown);
        self.phase = SessionPhase::Active;
    }

    /// Enter a terminal phase. Returns `false` if already terminal.
    fn end(&mut self, reason: LogoutReason) -> bool {
        if self.phase.is_terminal() {
            return false;
        }
        self.scheduler.cancel_all();
        self.dialog.terminate();
        self.phase = match reason {
            LogoutReason::Expired => SessionPhase::Expired,
            LogoutReason::UserRequested => SessionPhase::LoggedOut,
        };
        true
    }
}

/// Keeps one client session alive. See the module docs for the lifecycle.
pub struct SessionManager {
    /// Identifies this instance's broadcasts.
    id: Uuid,
    config: SessionConfig,
    storage: SessionStorage,
    api: Arc<dyn AuthApi>,
    clock: Arc<dyn Clock>,
    bus: SessionBus,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish()
    }
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        storage: SessionStorage,
        api: Arc<dyn AuthApi>,
        clock: Arc<dyn Clock>,
        bus: SessionBus,
    ) -> Self {
        let state = SessionState::new(&config, clock.now());
        Self {
            id: Uuid::new_v4(),
            config,
            storage,
            api,
            clock,
            bus,
            state: Mutex::new(state),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }

    /// Mount: reset the session clock to now, schedule the periodic
    /// timers, and register listeners. Returns the receiver the owner
    /// should feed into [`handle_event`](Self::handle_event).
    pub async fn start(&self) -> broadcast::Receiver<EventEnvelope> {
        let now = self.clock.now();
        let events = self.bus.subscribe();

        let mut state = self.state.lock().await;
        *state = SessionState::new(&self.config, now);
        state
            .scheduler
            .schedule(TimerName::ProactiveRefresh, self.config.refresh_interval(), now);
        state.scheduler.schedule(
            TimerName::InactivityCheck,
            self.config.inactivity_check_interval(),
            now,
        );
        state
            .scheduler
            .schedule(TimerName::ExpiryCheck, self.config.expiry_check_interval(), now);
        state.listeners.extend(ListenerKind::ALL);
        state.mounted = true;

        info!(
            manager_id = %self.id,
            next_refresh = ?state.scheduler.next_due(TimerName::ProactiveRefresh),
            refresh_every_minutes = self.config.refresh_interval_minutes,
            session_minutes = self.config.session_duration_minutes,
            "Session manager started"
        );

        events
    }

    /// Unmount: cancel every timer and unregister every listener.
    /// Afterwards `tick()` fires nothing and inputs are ignored.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        let timers = state.scheduler.cancel_all();
        let listeners = state.listeners.len();
        state.listeners.clear();
        state.mounted = false;

        info!(
            manager_id = %self.id,
            timers_cancelled = timers,
            listeners_removed = listeners,
            "Session manager shut down"
        );
    }

    /// Record a user interaction. Returns whether it moved `last_activity`.
    pub async fn record_activity(&self, kind: ActivityKind) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        if !state.listening(ListenerKind::Activity) {
            return false;
        }

        let accepted = state.activity.record(now);
        if accepted {
            trace!(?kind, "Activity recorded");
        }
        accepted
    }

    /// React to the client moving between foreground and background.
    ///
    /// Only a hidden → visible transition does anything. Becoming visible
    /// counts as activity and refreshes right away when more than half the
    /// refresh cadence has passed since the last successful refresh.
    /// Returns whether a refresh was attempted.
    pub async fn on_visibility_change(&self, visibility: Visibility) -> bool {
        let now = self.clock.now();
        let needs_refresh = {
            let mut state = self.state.lock().await;
            if !state.listening(ListenerKind::Visibility) || state.phase.is_terminal() {
                return false;
            }

            let previous = std::mem::replace(&mut state.visibility, visibility);
            if visibility == Visibility::Hidden || previous == Visibility::Visible {
                debug!(?visibility, "Client visibility unchanged or hidden");
                return false;
            }

            state.activity.touch(now);
            let since_refresh = (now - state.last_refresh).to_std().unwrap_or(Duration::ZERO);
            since_refresh > self.config.refresh_interval() / 2
        };

        if !needs_refresh {
            debug!("Client visible; tokens recent enough");
            return false;
        }

        info!("Client visible after a long absence; refreshing tokens");
        self.refresh().await;
        true
    }

    /// Run the refresh protocol once.
    ///
    /// Failures of any kind are logged and leave the stored pair exactly
    /// as it was; the next scheduled tick simply tries again.
    pub async fn refresh(&self) -> RefreshOutcome {
        let refresh_token = match self.storage.refresh_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No refresh token stored; skipping refresh");
                return RefreshOutcome::NoRefreshToken;
            }
            Err(e) => {
                warn!(error = %e, "Could not read refresh token");
                return RefreshOutcome::Failed;
            }
        };

        let response = match self.api.refresh(&refresh_token).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    error = %e,
                    rejected = e.is_authentication(),
                    "Token refresh failed; keeping current tokens"
                );
                return RefreshOutcome::Failed;
            }
        };

        if self.state.lock().await.phase.is_terminal() {
            debug!("Session ended while refreshing; discarding new tokens");
            return RefreshOutcome::Failed;
        }

        let pair = match self.storage.apply_refresh(response, &refresh_token).await {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                debug!("Stored refresh token changed while refreshing; discarding new tokens");
                return RefreshOutcome::Failed;
            }
            Err(e) => {
                error!(error = %e, "Failed to store refreshed tokens");
                return RefreshOutcome::Failed;
            }
        };

        let now = self.clock.now();
        {
            let mut state = self.state.lock().await;
            state.activity.touch(now);
            state.session_start = now;
            state.last_refresh = now;
        }

        self.sync_profile(&pair.access_token).await;
        self.publish(SessionEvent::Refreshed, now);

        info!(manager_id = %self.id, "Session tokens refreshed");
        RefreshOutcome::Refreshed
    }

    /// Re-query the profile with a fresh access token and cache it.
    /// Failure only costs the cache update.
    async fn sync_profile(&self, access_token: &str) {
        match self.api.profile(access_token).await {
            Ok(profile) => match self.storage.set_profile_for(access_token, &profile).await {
                Ok(true) => debug!(username = %profile.username, "User profile cached"),
                Ok(false) => debug!("Tokens changed before the profile arrived; not caching"),
                Err(e) => warn!(error = %e, "Failed to cache user profile"),
            },
            Err(e) => warn!(error = %e, "Failed to fetch user profile after refresh"),
        }
    }

    /// Run every timer that is due now. Returns the timers that fired.
    pub async fn tick(&self) -> Vec<TimerName> {
        let now = self.clock.now();
        let due = {
            let mut state = self.state.lock().await;
            if !state.mounted || state.scheduler.is_empty() {
                return Vec::new();
            }
            state.scheduler.due(now)
        };

        for timer in &due {
            trace!(%timer, "Timer fired");
            match timer {
                TimerName::ProactiveRefresh => {
                    debug!("Proactive token refresh");
                    self.refresh().await;
                }
                TimerName::InactivityCheck => self.check_inactivity().await,
                TimerName::ExpiryCheck | TimerName::Countdown => self.check_expiry().await,
            }

            if self.state.lock().await.phase.is_terminal() {
                break;
            }
        }

        due
    }

    /// Idle beyond the threshold still refreshes: an open client keeps
    /// its session regardless of inactivity.
    async fn check_inactivity(&self) {
        let now = self.clock.now();
        let idle = self.state.lock().await.activity.idle_for(now);

        if idle > self.config.inactivity_threshold() {
            warn!(
                idle_minutes = idle.as_secs() / 60,
                threshold_minutes = self.config.inactivity_threshold_minutes,
                "User inactive beyond threshold; refreshing session anyway"
            );
            self.refresh().await;
        } else {
            trace!(idle_seconds = idle.as_secs(), "Inactivity check passed");
        }
    }

    /// The single place that turns remaining time into dialog and phase
    /// changes. Both the minute check and the per-second countdown go
    /// through here.
    async fn check_expiry(&self) {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        if state.phase.is_terminal() {
            return;
        }

        let remaining_ms = self.remaining_millis(&state, now);
        if remaining_ms <= 0 {
            drop(state);
            info!("Session time exhausted; logging out");
            if let Err(e) = self.logout(LogoutReason::Expired).await {
                error!(error = %e, "Failed to clear storage on session expiry");
            }
            return;
        }

        let remaining_secs = (remaining_ms as u64).div_ceil(1000);
        if remaining_secs <= self.config.warning_window_seconds {
            if state.dialog.show(remaining_secs) {
                state.phase = SessionPhase::WarningShown;
                state
                    .scheduler
                    .schedule(TimerName::Countdown, self.config.countdown_interval(), now);
                drop(state);

                warn!(remaining_seconds = remaining_secs, "Session about to expire");
                self.publish(
                    SessionEvent::WarningShown {
                        remaining_seconds: remaining_secs,
                    },
                    now,
                );
            } else {
                state.dialog.update_countdown(remaining_secs);
            }
        } else if state.dialog.is_visible() {
            // Renewed by a background refresh while the warning was up.
            state.dialog.hide();
            state.scheduler.cancel(TimerName::Countdown);
            state.phase = SessionPhase::Active;
            debug!("Session renewed; warning hidden");
        }
    }

    /// "Extend" from the warning dialog: refresh now, restart the session
    /// window, hide the dialog, and tell other instances.
    pub async fn extend_session(&self) -> AppResult<RefreshOutcome> {
        if self.state.lock().await.phase.is_terminal() {
            return Err(AppError::session("Session already ended; log in again"));
        }

        let outcome = self.refresh().await;
        let now = self.clock.now();
        self.state.lock().await.renew(now);
        self.publish(SessionEvent::Extended, now);

        info!(%outcome, "Session extended");
        Ok(outcome)
    }

    /// End the session: stop every timer, clear tokens and profile, and
    /// announce `auth:logout` with the login route. Ending an already
    /// ended session does nothing.
    pub async fn logout(&self, reason: LogoutReason) -> AppResult<()> {
        let now = self.clock.now();
        if !self.state.lock().await.end(reason) {
            return Ok(());
        }

        let cleared = self.storage.clear().await;
        self.publish(
            SessionEvent::Logout {
                reason,
                redirect_to: self.config.login_route.clone(),
            },
            now,
        );

        info!(manager_id = %self.id, %reason, "Logged out");
        cleared
    }

    /// Apply an event broadcast by another instance.
    pub async fn handle_event(&self, envelope: &EventEnvelope) {
        if envelope.origin == self.id {
            return;
        }

        let mut state = self.state.lock().await;
        if !state.listening(ListenerKind::SessionEvents) || state.phase.is_terminal() {
            return;
        }

        match &envelope.event {
            SessionEvent::Extended => {
                state.last_refresh = state.last_refresh.max(envelope.timestamp);
                state.renew(envelope.timestamp);
                debug!(origin = %envelope.origin, "Session extended by another instance");
            }
            SessionEvent::Refreshed => {
                state.session_start = envelope.timestamp;
                state.last_refresh = envelope.timestamp;
                debug!(origin = %envelope.origin, "Tokens refreshed by another instance");
            }
            SessionEvent::Logout { reason, .. } => {
                state.end(*reason);
                info!(origin = %envelope.origin, %reason, "Logged out by another instance");
            }
            SessionEvent::WarningShown { .. } => {}
        }
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let now = self.clock.now();
        let state = self.state.lock().await;
        let remaining_ms = self.remaining_millis(&state, now).max(0) as u64;

        SessionSnapshot {
            phase: state.phase,
            mounted: state.mounted,
            last_activity: state.activity.last_activity(),
            session_start: state.session_start,
            last_refresh: state.last_refresh,
            remaining: Duration::from_millis(remaining_ms),
            dialog: state.dialog.state(),
            countdown_seconds: state.dialog.countdown_seconds(),
            timers: state.scheduler.scheduled(),
            listeners: state.listeners.iter().copied().collect(),
        }
    }

    fn remaining_millis(&self, state: &SessionState, now: DateTime<Utc>) -> i64 {
        let ends = chrono::Duration::from_std(self.config.session_duration())
            .ok()
            .and_then(|duration| state.session_start.checked_add_signed(duration))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        (ends - now).num_milliseconds()
    }

    fn publish(&self, event: SessionEvent, at: DateTime<Utc>) {
        self.bus.publish(EventEnvelope::new(self.id, at, event));
    }
}
