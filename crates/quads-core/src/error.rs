//! Error types for QUADS API operations.
//!
//! Every failure a caller can observe is one [`Error`] variant, and every
//! variant maps to one [`ErrorKind`] so callers can branch on the class of
//! failure without inspecting messages.

use serde::Serialize;
use thiserror::Error;

/// Message attached to every HTTP 500 response.
pub const SERVER_ERROR_MESSAGE: &str = "Check the flask server logs";

/// Message used when a 400 response body is not valid JSON.
pub const BAD_REQUEST_PARSE_MESSAGE: &str = "Failed to parse response";

/// Main error type for QUADS operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The server answered with HTTP 500
    #[error("Server error: {0}")]
    ServerError(String),

    /// The server answered with HTTP 400
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request never produced a usable response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request exceeded its timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Login or logout was rejected by the server
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A success response carried a body that is not JSON
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Specialized result type for QUADS operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The backend malfunctioned (HTTP 500)
    Server,
    /// The backend rejected the request (HTTP 400)
    BadRequest,
    /// No response was received, or only transient gateway errors were
    Transport,
    /// The failure happened on the client side before or after the exchange
    Client,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServerError(_) => "SERVER_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ServerError(_) => ErrorKind::Server,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::Transport(_) | Self::Timeout(_) => ErrorKind::Transport,
            Self::AuthenticationFailed(_)
            | Self::ParseError(_)
            | Self::ConfigError(_)
            | Self::InvalidEndpoint(_)
            | Self::ValidationError(_) => ErrorKind::Client,
        }
    }

    /// The server-supplied (or fixed) message, without the variant prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::ServerError(msg)
            | Self::BadRequest(msg)
            | Self::Transport(msg)
            | Self::Timeout(msg)
            | Self::AuthenticationFailed(msg)
            | Self::ParseError(msg)
            | Self::ConfigError(msg)
            | Self::InvalidEndpoint(msg)
            | Self::ValidationError(msg) => msg,
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ServerError(_) | Self::ConfigError(_) | Self::Transport(_)
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_builder() {
            Self::ConfigError(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
