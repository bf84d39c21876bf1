//! REST client error taxonomy.

use thiserror::Error;

use visadesk_core::error::{AppError, ErrorKind};

/// Failure of a REST call, classified by how the caller should react.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response, or a transient status
    /// (408, 429) was returned. Safe to retry.
    #[error("network error: {0}")]
    Network(String),
    /// The session was rejected (401/403). The user must re-authenticate.
    #[error("session rejected ({status}): {message}")]
    Auth {
        /// HTTP status code.
        status: u16,
        /// Server-provided message.
        message: String,
    },
    /// The target no longer exists (404/410).
    #[error("not found: {0}")]
    NotFound(String),
    /// The server failed or answered with an unexpected status.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided message.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),
    /// The client is misconfigured (bad base URL, invalid token header).
    #[error("invalid client configuration: {0}")]
    Configuration(String),
}

/// Result alias for REST calls.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Auth { status, message },
            404 | 410 => Self::NotFound(message),
            408 | 429 => Self::Network(format!("HTTP {status}: {message}")),
            _ => Self::Server { status, message },
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), err.to_string())
        } else if err.is_builder() {
            Self::Configuration(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        let kind = match &err {
            ApiError::Network(_) => ErrorKind::ServiceUnavailable,
            ApiError::Auth { .. } => ErrorKind::Authentication,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Server { .. } => ErrorKind::ExternalService,
            ApiError::Decode(_) => ErrorKind::Serialization,
            ApiError::Configuration(_) => ErrorKind::Configuration,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
