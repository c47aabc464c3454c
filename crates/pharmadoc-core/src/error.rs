//! Unified application error types for PharmaDoc.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Authentication failed (rejected credentials, dead refresh token, etc.).
    Authentication,
    /// An internal error occurred.
    Internal,
    /// Reading or writing the client-side token storage failed.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A session-related error occurred.
    Session,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// The backend API could not be reached or answered unexpectedly.
    ExternalService,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Session => write!(f, "SESSION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
        }
    }
}

/// The unified application error used throughout PharmaDoc.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a session error.
    pub fn session(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Session, message)
    }

    /// Create an external service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Whether this error means the backend rejected our credentials.
    pub fn is_authentication(&self) -> bool {
        self.kind == ErrorKind::Authentication
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = AppError::authentication("refresh token rejected");
        assert_eq!(err.to_string(), "AUTHENTICATION: refresh token rejected");
        assert!(err.is_authentication());
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse_err.into();
        assert_eq!(err.kind, ErrorKind::Serialization);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(ErrorKind::Storage.to_string(), "STORAGE");
        assert_eq!(ErrorKind::ExternalService.to_string(), "EXTERNAL_SERVICE");
        assert_eq!(
            AppError::session("no session to extend").to_string(),
            "SESSION: no session to extend"
        );
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err: AppError = io.into();
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Storage);
        assert!(cloned.source.is_none());
    }
}
