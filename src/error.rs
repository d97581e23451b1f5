//! Error types for the page analysis service.
//!
//! This module provides structured error handling with:
//! - `AppError`: Domain-specific errors for pipeline and persistence operations
//! - `CommandError`: Wrapper for HTTP handler errors (serializable, maps to a status code)
//! - `Result<T>`: Type alias for Results using AppError

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// ============================================================================
// DOMAIN ERROR TYPE
// ============================================================================

/// Domain-specific errors for application operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or malformed input (bad URL, unsupported scheme)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An operation did not finish within its time budget
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// DNS, connection or TLS failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// External service (scrape API, language model, browser) returned an error or malformed payload
    #[error("Upstream error ({service}): {message}")]
    UpstreamError { service: &'static str, message: String },

    /// Failed to parse HTML content
    #[error("HTML parsing error: {0}")]
    ParseError(String),

    /// Database operation failed
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    /// Record not found
    #[error("Analysis not found: {0}")]
    NotFound(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkError(msg.into())
    }

    /// Create an upstream service error
    pub fn upstream(service: &'static str, msg: impl Into<String>) -> Self {
        Self::UpstreamError {
            service,
            message: msg.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::PersistenceError(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify a transport error from the HTTP client.
    pub fn from_transport(service: &'static str, err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if err.is_connect() || err.is_request() {
            Self::NetworkError(format!("{service}: {err}"))
        } else {
            Self::upstream(service, err.to_string())
        }
    }

    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Timeout(_) => "timeout",
            Self::NetworkError(_) => "network_error",
            Self::UpstreamError { .. } => "upstream_error",
            Self::ParseError(_) => "parse_error",
            Self::PersistenceError(_) => "persistence_error",
            Self::NotFound(_) => "not_found",
            Self::Config(_) => "config_error",
            Self::Other(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::NetworkError(_) | Self::UpstreamError { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

// ============================================================================
// COMMAND ERROR (FOR HTTP HANDLERS)
// ============================================================================

/// Wrapper for errors returned from HTTP handlers.
/// Serializes to `{ "error": ..., "code": ... }` with a matching status code.
#[derive(Debug)]
pub struct CommandError(pub AppError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl std::error::Error for CommandError {}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {:#}", self.0);
        } else {
            log::debug!("Request rejected: {}", self.0);
        }
        let body = ErrorBody {
            error: self.0.to_string(),
            code: self.0.code(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(error: anyhow::Error) -> Self {
        Self(AppError::Other(error))
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        Self(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_maps_to_bad_request() {
        let err = AppError::invalid_input("not a url");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(err.to_string(), "Invalid input: not a url");
    }

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let err = AppError::Timeout(30);
        assert_eq!(err.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.to_string(), "Timed out after 30s");
    }

    #[test]
    fn anyhow_errors_become_internal() {
        let err: CommandError = anyhow::anyhow!("boom").into();
        assert_eq!(err.0.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.0.code(), "internal_error");
    }
}
