//! Backend client error types

use thiserror::Error;

/// Errors that can occur when talking to the managed backend
#[derive(Error, Debug)]
pub enum BackendError {
    /// No signed-in session to authorize the request with
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Backend unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Record does not exist (already deleted, or never created)
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Response body or stream payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// Live query stream closed by the backend
    #[error("Subscription closed")]
    Closed,
}

impl BackendError {
    /// Classify a transport error the way the rest of the client reports it
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_connect() {
            BackendError::Unavailable
        } else {
            BackendError::Request(err)
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Result type alias for backend operations
pub type BackendResult<T> = Result<T, BackendError>;
