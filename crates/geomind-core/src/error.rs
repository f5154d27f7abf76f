//! Centralized error types for the GeoMind application.
//!
//! This module provides a typed error hierarchy that:
//! - Enables precise error handling throughout the codebase
//! - Provides user-friendly messages suitable for display
//! - Preserves full error context for debugging/logging

use thiserror::Error;

/// Top-level application error type.
///
/// Start-up and wiring failures are funnelled into this type by the binary.
/// Use `user_message()` to get a display-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Classify an `anyhow` error by the typed error at its root.
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        let err = match err.downcast::<ConfigError>() {
            Ok(config) => return AppError::Config(config),
            Err(err) => err,
        };
        match err.downcast::<std::io::Error>() {
            Ok(io) => AppError::Io(io),
            Err(other) => AppError::Other(other),
        }
    }

    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_conversion() {
        let cfg_err = ConfigError::MissingSetting("ai.api_key".into());
        let app_err: AppError = cfg_err.into();
        assert!(matches!(app_err, AppError::Config(ConfigError::MissingSetting(_))));
    }

    #[test]
    fn test_from_anyhow_finds_config_error_under_context() {
        use anyhow::Context;

        let err = Err::<(), _>(ConfigError::ParseError("line 1".into()))
            .context("Failed to parse config file")
            .unwrap_err();
        let app_err = AppError::from_anyhow(err);
        assert!(matches!(app_err, AppError::Config(ConfigError::ParseError(_))));
        assert_eq!(
            app_err.user_message(),
            "Configuration file is malformed. Check your settings."
        );
    }

    #[test]
    fn test_from_anyhow_classifies_io_and_other() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = anyhow::Error::new(io).context("Failed to write config file");
        let app_err = AppError::from_anyhow(err);
        assert!(matches!(app_err, AppError::Io(_)));

        let app_err = AppError::from_anyhow(anyhow::anyhow!("no runtime"));
        assert!(matches!(app_err, AppError::Other(_)));
        assert_eq!(
            app_err.user_message(),
            "An unexpected error occurred. Please try again."
        );
    }

    #[test]
    fn test_display_includes_detail() {
        let err = ConfigError::MissingSetting("ai.api_key".into());
        assert_eq!(err.to_string(), "Missing required setting: ai.api_key");
    }
}
