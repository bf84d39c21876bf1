//! Message metrics helpers.

use std::sync::atomic::Ordering;

use super::RealtimeMetrics;

/// Record a push event received from the server
pub fn record_received(metrics: &RealtimeMetrics) {
    metrics.messages_received.fetch_add(1, Ordering::Relaxed);
}

/// Record a push event dropped by validation
pub fn record_dropped(metrics: &RealtimeMetrics) {
    metrics.events_dropped.fetch_add(1, Ordering::Relaxed);
}
