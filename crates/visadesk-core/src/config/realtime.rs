//! Push connection configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Persistent push connection settings: endpoint, reconnect timing, heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// WebSocket endpoint of the notification service.
    pub push_url: String,
    /// Delay before the first retry after a dropped connection, in milliseconds.
    pub initial_delay_ms: u64,
    /// Ceiling for the reconnect delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Consecutive failed attempts after which auto-retry stops.
    pub max_reconnect_attempts: u32,
    /// Seconds without server activity before the connection is considered stale.
    pub heartbeat_timeout_seconds: u64,
    /// Seconds between client keepalive pings.
    pub keepalive_interval_seconds: u64,
    /// Capacity of the pushed-event queue between transport and dispatcher.
    pub event_buffer_size: usize,
}

impl RealtimeConfig {
    /// Initial reconnect delay.
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Maximum reconnect delay.
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Heartbeat staleness window.
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_seconds)
    }

    /// Keepalive ping interval.
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_seconds)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            push_url: "ws://localhost:8080/ws/notifications".to_string(),
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            max_reconnect_attempts: 10,
            heartbeat_timeout_seconds: 60,
            keepalive_interval_seconds: 25,
            event_buffer_size: 256,
        }
    }
}
