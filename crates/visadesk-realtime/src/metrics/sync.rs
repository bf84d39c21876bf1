//! Polling and mutation metrics helpers.

use std::sync::atomic::Ordering;

use super::RealtimeMetrics;

/// Record the poller entering the polling state
pub fn record_fallback(metrics: &RealtimeMetrics) {
    metrics.fallback_activations.fetch_add(1, Ordering::Relaxed);
}

/// Record a poll and whether it succeeded
pub fn record_poll(metrics: &RealtimeMetrics, ok: bool) {
    metrics.polls_issued.fetch_add(1, Ordering::Relaxed);
    if !ok {
        metrics.polls_failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Record a committed mutation
pub fn record_commit(metrics: &RealtimeMetrics) {
    metrics.mutations_committed.fetch_add(1, Ordering::Relaxed);
}

/// Record a rolled-back mutation
pub fn record_rollback(metrics: &RealtimeMetrics) {
    metrics.mutations_rolled_back.fetch_add(1, Ordering::Relaxed);
}
