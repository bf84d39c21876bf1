//! Error types of the notification engine.
//!
//! Transport and validation errors are recovered locally and only ever show
//! up as connection state or diagnostics. Mutation errors are returned to
//! the UI action that started the mutation, after rollback.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use visadesk_client::{ApiError, DecodeError};
use visadesk_core::error::{AppError, ErrorKind};
use visadesk_core::types::id::NotificationId;

/// Connection-level failure of the push transport.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TransportError {
    /// The connection could not be established.
    #[error("handshake failed: {0}")]
    Handshake(String),
    /// The connection was closed or broke while open.
    #[error("connection closed: {0}")]
    Closed(String),
    /// No server activity was observed within the heartbeat window.
    #[error("no server activity for {0:?}")]
    HeartbeatTimeout(Duration),
    /// The peer violated the framing protocol.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Automatic reconnection stopped.
    #[error("gave up after {attempts} consecutive failed attempts: {last}")]
    ReconnectExhausted {
        /// Number of consecutive failures.
        attempts: u32,
        /// Description of the last failure.
        last: String,
    },
}

/// A pushed event that could not be turned into a domain event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The event name is not one of the three notification events.
    #[error("unknown event '{0}'")]
    UnknownEvent(String),
    /// The payload is not the expected JSON shape.
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// Required fields are missing or invalid.
    #[error("invalid fields: {0}")]
    InvalidFields(String),
    /// An update for an unknown notification did not carry a full body.
    #[error("update for unknown notification {0} lacks a full body")]
    IncompleteUpdate(NotificationId),
}

impl From<DecodeError> for ValidationError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::Malformed(msg) => Self::Malformed(msg),
            DecodeError::InvalidFields(msg) => Self::InvalidFields(msg),
        }
    }
}

/// Typed, user-displayable failure of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// Transient network failure; the action may be retried.
    #[error("network error: {0}")]
    Network(String),
    /// The session is no longer valid; the user must sign in again.
    #[error("session expired: {0}")]
    Auth(String),
    /// The notification no longer exists.
    #[error("not found: {0}")]
    NotFound(String),
    /// The server failed; retrying later may help.
    #[error("server error: {0}")]
    Server(String),
}

impl MutationError {
    /// Whether the caller may retry the same action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server(_))
    }

    /// Short message suitable for a toast.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) => "Connection problem. Your change was not saved, please try again.",
            Self::Auth(_) => "Your session has expired. Please sign in again.",
            Self::NotFound(_) => "This notification no longer exists.",
            Self::Server(_) => "The server could not save your change. Please try again later.",
        }
    }
}

impl From<ApiError> for MutationError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Network(msg) => Self::Network(msg),
            ApiError::Auth { message, .. } => Self::Auth(message),
            ApiError::NotFound(msg) => Self::NotFound(msg),
            ApiError::Server { status, message } => Self::Server(format!("HTTP {status}: {message}")),
            ApiError::Decode(msg) => Self::Server(format!("unreadable response: {msg}")),
            ApiError::Configuration(msg) => Self::Server(format!("client misconfigured: {msg}")),
        }
    }
}

impl From<MutationError> for AppError {
    fn from(err: MutationError) -> Self {
        let kind = match &err {
            MutationError::Network(_) => ErrorKind::ServiceUnavailable,
            MutationError::Auth(_) => ErrorKind::Authentication,
            MutationError::NotFound(_) => ErrorKind::NotFound,
            MutationError::Server(_) => ErrorKind::ExternalService,
        };
        AppError::new(kind, err.to_string())
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::transport(err.to_string())
    }
}
