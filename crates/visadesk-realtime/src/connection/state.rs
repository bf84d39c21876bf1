//! Observable connection state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::TransportError;

/// Lifecycle phase of the push connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    /// `connect()` has not been called yet.
    Idle,
    /// A handshake is in flight.
    Connecting,
    /// The connection is open and events flow.
    Connected,
    /// Waiting for the backoff delay before the next attempt.
    Reconnecting,
    /// Automatic reconnection gave up; only an explicit `connect()` resumes.
    Failed,
    /// Closed on request.
    Disconnected,
}

impl ConnectionPhase {
    /// Lowercase label used in logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
            Self::Disconnected => "disconnected",
        }
    }
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the push connection, published on every transition.
///
/// `is_connected` and `is_connecting` are derived from a single phase, so
/// they can never both be true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    /// Current phase.
    pub phase: ConnectionPhase,
    /// Most recent transport failure, cleared on a successful connect.
    pub last_error: Option<TransportError>,
    /// Consecutive failed attempts since the last successful connect.
    pub reconnect_attempts: u32,
    /// When the current or most recent connection was established.
    pub last_connected_at: Option<DateTime<Utc>>,
    /// Identifier of the open connection, used to correlate logs.
    pub connection_id: Option<Uuid>,
}

impl ConnectionState {
    /// The state before `connect()` is called.
    pub fn idle() -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            last_error: None,
            reconnect_attempts: 0,
            last_connected_at: None,
            connection_id: None,
        }
    }

    /// Whether the connection is open.
    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }

    /// Whether a handshake is in flight.
    pub fn is_connecting(&self) -> bool {
        self.phase == ConnectionPhase::Connecting
    }

    /// Whether automatic reconnection has stopped.
    pub fn is_failed(&self) -> bool {
        self.phase == ConnectionPhase::Failed
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::idle()
    }
}
