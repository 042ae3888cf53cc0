//! Error types for journey-export
//!
//! This module provides the error taxonomy for the export workflow, including:
//! - Domain-specific variants (auth, upstream, job state, timeout, download)
//! - HTTP status code mapping for the API boundary
//! - The JSON error body returned to callers

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::JobState;

/// Result type alias for journey-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message returned to callers when the platform rejects their credentials
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed: Invalid credentials";

/// Message returned to callers when a credential header is missing
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Email and password are required";

/// Main error type for journey-export
///
/// Every failure in the resolution workflow surfaces as one of these variants.
/// Nothing is retried internally except the poller's own bounded loop over
/// non-terminal job states.
#[derive(Debug, Error)]
pub enum Error {
    /// Request validation failed (missing credentials)
    #[error("{0}")]
    Validation(String),

    /// Login rejected by the platform or its response was unusable
    ///
    /// The display text is fixed; `reason` carries the diagnostic detail for logs.
    #[error("Authentication failed: Invalid credentials")]
    Auth {
        /// What went wrong (status code, missing header, missing tenant)
        reason: String,
    },

    /// A platform call other than login returned a non-success status
    #[error("{operation} failed: upstream returned {status}: {body}")]
    Upstream {
        /// The platform operation that failed (e.g. "list jobs")
        operation: &'static str,
        /// HTTP status code returned by the platform
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },

    /// The export job reached a terminal failure state
    #[error("export job {job_id} finished with state {state}")]
    JobFailed {
        /// Platform identifier of the job
        job_id: String,
        /// Terminal state observed (ERROR or CANCELLED)
        state: JobState,
    },

    /// The poller did not observe a terminal state in time
    #[error("export job did not complete within {}s", .waited.as_secs())]
    Timeout {
        /// Total time spent waiting
        waited: Duration,
    },

    /// A completed job carried no result reference
    #[error("export job {job_id} completed without a result file")]
    MissingResult {
        /// Platform identifier of the job
        job_id: String,
    },

    /// Fetching the finished file failed
    #[error("failed to download export file: {message}")]
    Download {
        /// HTTP status of the file response, if one was received
        status: Option<u16>,
        /// Human-readable description
        message: String,
    },

    /// The resolution was cancelled (caller went away or server is shutting down)
    #[error("export resolution cancelled")]
    Cancelled,

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "PORT")
        key: Option<String>,
    },

    /// Network error talking to the platform or the file host
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Create an [`Error::Auth`] with the given diagnostic reason
    pub fn auth(reason: impl Into<String>) -> Self {
        Error::Auth {
            reason: reason.into(),
        }
    }

    /// Create an [`Error::Config`] for a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// API error response format
///
/// Returned by every endpoint on failure.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "success": false,
///   "error": "Email and password are required"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Always `false`
    pub success: bool,

    /// Human-readable error message
    pub error: String,
}

impl ApiError {
    /// Create a new API error with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }

    /// Create the "route not found" error
    pub fn not_found() -> Self {
        Self::new("Not found")
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - missing credentials
            Error::Validation(_) => 400,

            // 401 Unauthorized - platform rejected the login
            Error::Auth { .. } => 401,

            // Everything else is reported as an internal failure
            Error::Upstream { .. }
            | Error::JobFailed { .. }
            | Error::Timeout { .. }
            | Error::MissingResult { .. }
            | Error::Download { .. }
            | Error::Cancelled
            | Error::Config { .. }
            | Error::Network(_)
            | Error::Serialization(_)
            | Error::Io(_)
            | Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Auth { .. } => "auth_error",
            Error::Upstream { .. } => "upstream_error",
            Error::JobFailed { .. } => "job_failed",
            Error::Timeout { .. } => "timeout",
            Error::MissingResult { .. } => "missing_result",
            Error::Download { .. } => "download_error",
            Error::Cancelled => "cancelled",
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError::new(error.to_string())
    }
}
