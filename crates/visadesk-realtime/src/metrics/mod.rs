//! Realtime engine metrics.

pub mod connections;
pub mod messages;
pub mod sync;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug)]
pub struct RealtimeMetrics {
    /// Push connection attempts started
    pub connection_attempts: AtomicU64,
    /// Attempts that reached the connected state
    pub connections_succeeded: AtomicU64,
    /// Attempts that failed during the handshake
    pub connections_failed: AtomicU64,
    /// Established connections dropped for lack of server activity
    pub heartbeat_timeouts: AtomicU64,
    /// Push events received
    pub messages_received: AtomicU64,
    /// Push events dropped by validation
    pub events_dropped: AtomicU64,
    /// Times the poller entered the polling state
    pub fallback_activations: AtomicU64,
    /// REST polls issued
    pub polls_issued: AtomicU64,
    /// REST polls that failed
    pub polls_failed: AtomicU64,
    /// Mutations confirmed by the server
    pub mutations_committed: AtomicU64,
    /// Mutations rolled back after a failure
    pub mutations_rolled_back: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self {
            connection_attempts: AtomicU64::new(0),
            connections_succeeded: AtomicU64::new(0),
            connections_failed: AtomicU64::new(0),
            heartbeat_timeouts: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            fallback_activations: AtomicU64::new(0),
            polls_issued: AtomicU64::new(0),
            polls_failed: AtomicU64::new(0),
            mutations_committed: AtomicU64::new(0),
            mutations_rolled_back: AtomicU64::new(0),
        }
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connection_attempts: self.connection_attempts.load(Ordering::Relaxed),
            connections_succeeded: self.connections_succeeded.load(Ordering::Relaxed),
            connections_failed: self.connections_failed.load(Ordering::Relaxed),
            heartbeat_timeouts: self.heartbeat_timeouts.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            fallback_activations: self.fallback_activations.load(Ordering::Relaxed),
            polls_issued: self.polls_issued.load(Ordering::Relaxed),
            polls_failed: self.polls_failed.load(Ordering::Relaxed),
            mutations_committed: self.mutations_committed.load(Ordering::Relaxed),
            mutations_rolled_back: self.mutations_rolled_back.load(Ordering::Relaxed),
        }
    }
}

impl Default for RealtimeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Push connection attempts started
    pub connection_attempts: u64,
    /// Attempts that reached the connected state
    pub connections_succeeded: u64,
    /// Attempts that failed during the handshake
    pub connections_failed: u64,
    /// Connections dropped for lack of server activity
    pub heartbeat_timeouts: u64,
    /// Push events received
    pub messages_received: u64,
    /// Push events dropped by validation
    pub events_dropped: u64,
    /// Times the poller entered the polling state
    pub fallback_activations: u64,
    /// REST polls issued
    pub polls_issued: u64,
    /// REST polls that failed
    pub polls_failed: u64,
    /// Mutations confirmed by the server
    pub mutations_committed: u64,
    /// Mutations rolled back after a failure
    pub mutations_rolled_back: u64,
}
