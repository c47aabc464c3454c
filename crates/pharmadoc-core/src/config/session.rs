//! Session keep-alive configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound for any configured interval or duration.
pub const MAX_SPAN: Duration = Duration::from_secs(10 * 365 * 24 * 3600);

/// Cadences and thresholds for the session manager.
///
/// The defaults keep a 24 hour session alive with a proactive refresh
/// every 12 hours and warn five minutes before the session boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Proactive token refresh cadence in minutes.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u64,
    /// How often the inactivity checker runs, in minutes.
    #[serde(default = "default_inactivity_check_interval")]
    pub inactivity_check_interval_minutes: u64,
    /// Inactivity threshold in minutes.
    #[serde(default = "default_inactivity_threshold")]
    pub inactivity_threshold_minutes: u64,
    /// How often the remaining session time is checked, in seconds.
    #[serde(default = "default_expiry_check_interval")]
    pub expiry_check_interval_seconds: u64,
    /// Nominal session length in minutes.
    #[serde(default = "default_session_duration")]
    pub session_duration_minutes: u64,
    /// The warning is shown once this many seconds or fewer remain.
    #[serde(default = "default_warning_window")]
    pub warning_window_seconds: u64,
    /// Minimum spacing between two recorded activity events, in milliseconds.
    #[serde(default = "default_activity_throttle")]
    pub activity_throttle_millis: u64,
    /// Countdown display update cadence in seconds.
    #[serde(default = "default_countdown_interval")]
    pub countdown_interval_seconds: u64,
    /// Cadence of the single tick source driving every timer, in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_millis: u64,
    /// Route announced to listeners after a forced logout.
    #[serde(default = "default_login_route")]
    pub login_route: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: default_refresh_interval(),
            inactivity_check_interval_minutes: default_inactivity_check_interval(),
            inactivity_threshold_minutes: default_inactivity_threshold(),
            expiry_check_interval_seconds: default_expiry_check_interval(),
            session_duration_minutes: default_session_duration(),
            warning_window_seconds: default_warning_window(),
            activity_throttle_millis: default_activity_throttle(),
            countdown_interval_seconds: default_countdown_interval(),
            tick_interval_millis: default_tick_interval(),
            login_route: default_login_route(),
        }
    }
}

impl SessionConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.saturating_mul(60))
    }

    pub fn inactivity_check_interval(&self) -> Duration {
        Duration::from_secs(self.inactivity_check_interval_minutes.saturating_mul(60))
    }

    pub fn inactivity_threshold(&self) -> Duration {
        Duration::from_secs(self.inactivity_threshold_minutes.saturating_mul(60))
    }

    pub fn expiry_check_interval(&self) -> Duration {
        Duration::from_secs(self.expiry_check_interval_seconds)
    }

    pub fn session_duration(&self) -> Duration {
        Duration::from_secs(self.session_duration_minutes.saturating_mul(60))
    }

    pub fn warning_window(&self) -> Duration {
        Duration::from_secs(self.warning_window_seconds)
    }

    pub fn activity_throttle(&self) -> Duration {
        Duration::from_millis(self.activity_throttle_millis)
    }

    pub fn countdown_interval(&self) -> Duration {
        Duration::from_secs(self.countdown_interval_seconds)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_millis)
    }

    /// Reject zero cadences, durations longer than [`MAX_SPAN`], and a
    /// warning window that swallows the session.
    pub fn validate(&self) -> Result<(), AppError> {
        let cadences = [
            ("refresh_interval_minutes", self.refresh_interval()),
            (
                "inactivity_check_interval_minutes",
                self.inactivity_check_interval(),
            ),
            ("expiry_check_interval_seconds", self.expiry_check_interval()),
            ("session_duration_minutes", self.session_duration()),
            ("countdown_interval_seconds", self.countdown_interval()),
            ("tick_interval_millis", self.tick_interval()),
        ];

        for (name, value) in cadences {
            if value.is_zero() {
                return Err(AppError::configuration(format!(
                    "session.{name} must be greater than zero"
                )));
            }
        }

        let spans = cadences.into_iter().chain([
            ("inactivity_threshold_minutes", self.inactivity_threshold()),
            ("warning_window_seconds", self.warning_window()),
            ("activity_throttle_millis", self.activity_throttle()),
        ]);
        for (name, value) in spans {
            if value > MAX_SPAN {
                return Err(AppError::configuration(format!(
                    "session.{name} must not exceed ten years"
                )));
            }
        }

        if self.warning_window() >= self.session_duration() {
            return Err(AppError::configuration(
                "session.warning_window_seconds must be shorter than the session duration",
            ));
        }

        Ok(())
    }
}

fn default_refresh_interval() -> u64 {
    12 * 60
}

fn default_inactivity_check_interval() -> u64 {
    5
}

fn default_inactivity_threshold() -> u64 {
    23 * 60
}

fn default_expiry_check_interval() -> u64 {
    60
}

fn default_session_duration() -> u64 {
    24 * 60
}

fn default_warning_window() -> u64 {
    5 * 60
}

fn default_activity_throttle() -> u64 {
    1000
}

fn default_countdown_interval() -> u64 {
    1
}

fn default_tick_interval() -> u64 {
    250
}

fn default_login_route() -> String {
    "/login".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cadences() {
        let config = SessionConfig::default();
        assert_eq!(config.refresh_interval(), Duration::from_secs(12 * 3600));
        assert_eq!(config.inactivity_threshold(), Duration::from_secs(23 * 3600));
        assert_eq!(config.session_duration(), Duration::from_secs(24 * 3600));
        assert_eq!(config.warning_window(), Duration::from_secs(300));
        assert_eq!(config.activity_throttle(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let config = SessionConfig {
            expiry_check_interval_seconds: 0,
            ..SessionConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("expiry_check_interval_seconds"));
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let config = SessionConfig {
            refresh_interval_minutes: 1_000_000_000_000,
            ..SessionConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.message.contains("refresh_interval_minutes"));

        let config = SessionConfig {
            session_duration_minutes: u64::MAX,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ten_years_is_accepted() {
        let config = SessionConfig {
            session_duration_minutes: 10 * 365 * 24 * 60,
            inactivity_threshold_minutes: 10 * 365 * 24 * 60,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_warning_window_must_fit_session() {
        let config = SessionConfig {
            session_duration_minutes: 5,
            warning_window_seconds: 300,
            ..SessionConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
