//! Lectern error types

use std::time::Duration;

/// HTTP statuses the transport boundary treats as transient.
pub const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// Lectern error types
///
/// All variants are `Clone` so a single in-flight request can hand the same
/// failure to every caller awaiting it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LecternError {
    // Binder errors
    #[error("missing required parameter(s) for '{action}': {}", missing.join(", "))]
    MissingParameter {
        action: String,
        missing: Vec<String>,
    },

    // Configuration errors
    #[error("invalid cache configuration: {0}")]
    InvalidCacheConfiguration(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    // Executor errors
    #[error("request failed after {attempts} attempt(s): {source}")]
    RequestFailed {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// Raised by endpoint logic when a payload does not have the expected
    /// shape. Passes through the executor and binder untouched.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    // Tree errors
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    // Cache backend errors
    #[error("cache error: {0}")]
    Cache(String),
}

impl LecternError {
    /// Build a `MissingParameter` error for one action.
    pub fn missing(action: impl Into<String>, missing: Vec<String>) -> Self {
        Self::MissingParameter {
            action: action.into(),
            missing,
        }
    }

    /// Whether the underlying failure was transient (the request exhausted
    /// its retries rather than failing permanently).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// HTTP status of the last failed attempt, if the transport got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed {
                source: TransportError::Status { status, .. },
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LecternError {
    fn from(err: serde_json::Error) -> Self {
        LecternError::MalformedResponse(err.to_string())
    }
}

/// Failure reported by a [`Transport`](crate::transport::Transport).
///
/// The transport decides what is transient; the executor only ever retries
/// errors for which [`is_transient()`](Self::is_transient) returns `true`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// Connection-level failure (DNS, reset, timeout). Always transient.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        message: String,
        retry_after: Option<Duration>,
    },

    /// The response body could not be decoded.
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Build a status error without a `Retry-After` hint.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => RETRYABLE_STATUSES.contains(status),
            Self::Decode(_) => false,
        }
    }

    /// Server-provided hint for how long to wait before retrying.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for Lectern operations
pub type Result<T> = std::result::Result<T, LecternError>;
