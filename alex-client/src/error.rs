//! Error types for alex-client
//!
//! Every error surfaced to the user is a single human-readable message:
//! server errors display exactly the backend's `error` field (or the HTTP
//! reason phrase), so callers can print `err.to_string()` as-is.

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Request could not be sent or the connection failed
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-2xx status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// 2xx response whose body could not be decoded
    #[error("{0}")]
    Parse(String),

    /// Local form or input validation failed; no request was made
    #[error("{0}")]
    Validation(String),

    /// A status poll loop is already running for this meeting
    #[error("Meeting {0} is already being polled")]
    AlreadyPolling(i64),

    /// alex-common error
    #[error(transparent)]
    Common(#[from] alex_common::Error),
}

impl ClientError {
    /// HTTP status for backend errors
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
