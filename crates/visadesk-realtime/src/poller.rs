//! REST polling fallback while the push connection is degraded.
//!
//! The poller is a two-state machine driven by the connection state:
//!
//! - `Idle -> Polling` once the connection has been down for the whole
//!   grace period; the first poll fires immediately
//! - `Polling -> Idle` as soon as the connection is back; the interval is
//!   dropped, cancelling the next tick

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use visadesk_core::config::PollingConfig;

use crate::connection::state::ConnectionState;
use crate::metrics::{self, RealtimeMetrics};
use crate::notification::reconcile::Reconciler;

/// Poller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollerState {
    /// Push is healthy or still within the grace period.
    Idle,
    /// Fetching the REST listing on an interval.
    Polling,
}

/// Polls the REST listing while the push connection is down.
#[derive(Debug)]
pub struct FallbackPoller {
    reconciler: Arc<Reconciler>,
    config: PollingConfig,
    metrics: Arc<RealtimeMetrics>,
    state: watch::Sender<PollerState>,
}

impl FallbackPoller {
    /// Creates an idle poller.
    pub fn new(reconciler: Arc<Reconciler>, config: PollingConfig, metrics: Arc<RealtimeMetrics>) -> Self {
        let (state, _) = watch::channel(PollerState::Idle);
        Self {
            reconciler,
            config,
            metrics,
            state,
        }
    }

    /// Current state.
    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    /// Receiver that observes state changes.
    pub fn watch_state(&self) -> watch::Receiver<PollerState> {
        self.state.subscribe()
    }

    fn enter(&self, next: PollerState) {
        let changed = self.state.send_if_modified(|s| {
            let changed = *s != next;
            *s = next;
            changed
        });
        if changed && next == PollerState::Polling {
            metrics::sync::record_fallback(&self.metrics);
        }
    }

    /// Run one poll. Failures are logged and reported as `false`.
    pub async fn poll_once(&self) -> bool {
        match self.reconciler.sync().await {
            Ok(report) => {
                metrics::sync::record_poll(&self.metrics, true);
                debug!(fetched = report.fetched, upserted = report.upserted, removed = report.removed, "Poll complete");
                true
            }
            Err(e) => {
                metrics::sync::record_poll(&self.metrics, false);
                warn!(error = %e, "Poll failed; retrying on next tick");
                false
            }
        }
    }

    /// Drive the state machine from `connection` until `cancel` fires or the
    /// connection state sender is dropped.
    pub async fn run(&self, mut connection: watch::Receiver<ConnectionState>, cancel: CancellationToken) {
        loop {
            // Idle: wait for the connection to go down.
            while connection.borrow_and_update().is_connected() {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    changed = connection.changed() => if changed.is_err() { return },
                }
            }

            // Grace period: any connected observation aborts it.
            let deadline = Instant::now() + self.config.grace_period();
            let degraded = loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return,
                    changed = connection.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if connection.borrow_and_update().is_connected() {
                            break false;
                        }
                    }
                    _ = time::sleep_until(deadline) => break true,
                }
            };
            if !degraded {
                continue;
            }

            info!(
                interval_secs = self.config.interval_seconds,
                "Push connection degraded; polling for notifications"
            );
            self.enter(PollerState::Polling);
            let finished = self.poll_until_connected(&mut connection, &cancel).await;
            self.enter(PollerState::Idle);
            if finished {
                return;
            }
            info!("Push connection restored; polling stopped");
        }
    }

    /// Poll on the interval until connected. Returns `true` when the poller
    /// should stop entirely.
    async fn poll_until_connected(
        &self,
        connection: &mut watch::Receiver<ConnectionState>,
        cancel: &CancellationToken,
    ) -> bool {
        let mut ticker = time::interval(self.config.interval().max(time::Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return true,
                changed = connection.changed() => {
                    if changed.is_err() {
                        return true;
                    }
                    if connection.borrow_and_update().is_connected() {
                        return false;
                    }
                }
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => return true,
                        _ = self.poll_once() => {}
                    }
                }
            }
        }
    }
}
