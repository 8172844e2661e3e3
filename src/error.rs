// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Error types for RouterOS Monitor application

use thiserror::Error;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RouterOS API error (`!trap` reply or malformed response)
    #[error("RouterOS error: {0}")]
    RouterOs(String),

    /// Login rejected by the router
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// No live session for the requested router
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Operation did not complete in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Transport or feature not available in this build
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Metrics encoding error
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// The monitor task is no longer running
    #[error("Monitor task has stopped")]
    MonitorStopped,

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Address parsing error
    #[error("Address parse error")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl AppError {
    /// Returns true when the error means the session to the router is gone
    ///
    /// Traps and parse errors leave the session usable; transport failures do not.
    #[must_use]
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::Io(_) | Self::NotConnected(_) | Self::Timeout(_))
    }
}

/// Convenient alias for Result with application error
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = AppError::Config("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_router_os_error() {
        let err = AppError::RouterOs("no such command".to_string());
        assert_eq!(err.to_string(), "RouterOS error: no such command");
    }

    #[test]
    fn test_auth_error() {
        let err = AppError::Auth("invalid user name or password".to_string());
        assert_eq!(
            err.to_string(),
            "Authentication failed: invalid user name or password"
        );
    }

    #[test]
    fn test_metrics_error() {
        let err = AppError::Metrics("encoding failed".to_string());
        assert_eq!(err.to_string(), "Metrics error: encoding failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_addr_parse_error_conversion() {
        let parse_result = "invalid".parse::<std::net::IpAddr>();
        assert!(parse_result.is_err());
        let app_err: AppError = parse_result.unwrap_err().into();
        assert!(matches!(app_err, AppError::AddrParse(_)));
    }

    #[test]
    fn test_session_lost_classification() {
        let io = AppError::Io(std::io::Error::other("reset"));
        assert!(io.is_session_lost());
        assert!(AppError::NotConnected("r1".to_string()).is_session_lost());
        assert!(AppError::Timeout("read".to_string()).is_session_lost());
        assert!(!AppError::RouterOs("trap".to_string()).is_session_lost());
        assert!(!AppError::Auth("denied".to_string()).is_session_lost());
    }
}
