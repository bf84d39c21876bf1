//! Connection metrics helpers.

use std::sync::atomic::Ordering;

use super::RealtimeMetrics;

/// Record the start of a connection attempt
pub fn record_attempt(metrics: &RealtimeMetrics) {
    metrics.connection_attempts.fetch_add(1, Ordering::Relaxed);
}

/// Record an attempt that reached the connected state
pub fn record_connected(metrics: &RealtimeMetrics) {
    metrics.connections_succeeded.fetch_add(1, Ordering::Relaxed);
}

/// Record a failed handshake
pub fn record_failed(metrics: &RealtimeMetrics) {
    metrics.connections_failed.fetch_add(1, Ordering::Relaxed);
}

/// Record a heartbeat timeout
pub fn record_heartbeat_timeout(metrics: &RealtimeMetrics) {
    metrics.heartbeat_timeouts.fetch_add(1, Ordering::Relaxed);
}
