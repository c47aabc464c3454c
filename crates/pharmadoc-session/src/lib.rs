//! # pharmadoc-session
//!
//! Keeps a PharmaDoc session alive for as long as the client runs.
//!
//! ## Modules
//!
//! - `clock`: injectable time source
//! - `activity`: throttled user-activity tracking
//! - `scheduler`: named, independently cancellable timers driven by one tick source
//! - `warning`: expiry-warning dialog state machine
//! - `api`: auth endpoints (refresh, profile, login) over HTTP
//! - `bus`: broadcast of session events between instances
//! - `manager`: the session coordinator tying the above together
//! - `runner`: async loop feeding ticks, inputs, and events to a manager

pub mod activity;
pub mod api;
pub mod bus;
pub mod clock;
pub mod manager;
pub mod runner;
pub mod scheduler;
pub mod warning;

pub use activity::{ActivityKind, ActivityTracker, Visibility};
pub use api::{AuthApi, HttpAuthClient};
pub use bus::SessionBus;
pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{ListenerKind, RefreshOutcome, SessionManager, SessionPhase, SessionSnapshot};
pub use runner::{SessionInput, SessionRunner};
pub use scheduler::{Scheduler, TimerName};
pub use warning::{DialogState, WarningDialog};
