//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every section falls back to its defaults when absent.

pub mod api;
pub mod logging;
pub mod session;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::api::ApiConfig;
pub use self::logging::LoggingConfig;
pub use self::session::SessionConfig;
pub use self::storage::{StorageBackend, StorageConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend REST API settings.
    #[serde(default)]
    pub api: ApiConfig,
    /// Session keep-alive and expiry-warning settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Client-side token storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay
    /// and environment variables prefixed with `PHARMADOC__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::build(
            config::Config::builder()
                .add_source(config::File::with_name("config/default").required(false))
                .add_source(config::File::with_name(&format!("config/{env}")).required(false)),
        )
    }

    /// Load configuration from an explicit file, still honouring
    /// `PHARMADOC__` environment overrides.
    pub fn from_file(path: &str) -> Result<Self, AppError> {
        Self::build(
            config::Config::builder().add_source(config::File::with_name(path).required(false)),
        )
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AppError> {
        let config = builder
            .add_source(
                config::Environment::with_prefix("PHARMADOC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        Ok(parsed)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        self.session.validate()?;
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::configuration("api.base_url must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[api]\nbase_url = \"https://docs.example.com\"\n\n[session]\nwarning_window_seconds = 120\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.api.base_url, "https://docs.example.com");
        assert_eq!(config.session.warning_window_seconds, 120);
        assert_eq!(config.session.refresh_interval_minutes, 720);
        assert!(config.api.request_timeout_seconds.is_none());
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let mut config = AppConfig::default();
        config.api.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
