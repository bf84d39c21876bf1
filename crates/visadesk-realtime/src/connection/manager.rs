//! Connection manager: owns the single push connection of a session.
//!
//! A supervisor task performs the handshake, pumps frames into the event
//! channel while the connection is open, and schedules reconnects with
//! exponential backoff when it fails or goes stale.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::TransportError;
use crate::message::types::RawPushEvent;
use crate::metrics::{self, MetricsSnapshot, RealtimeMetrics};
use crate::observer::{ListenerRegistry, Subscription};

use super::backoff::ReconnectPolicy;
use super::heartbeat::{self, ActivityTracker, HeartbeatConfig};
use super::state::{ConnectionPhase, ConnectionState};
use super::transport::{PushChannel, PushFrame, PushTransport, SessionIdentity};

/// Why an open session ended.
enum SessionEnd {
    Cancelled,
    Lost(TransportError),
}

/// State shared between the manager and its supervisor task.
struct Shared {
    state: watch::Sender<ConnectionState>,
    listeners: ListenerRegistry<ConnectionState>,
    /// Serializes transitions against cancellation.
    gate: Mutex<()>,
}

impl Shared {
    /// Apply a transition unless `cancel` already fired, then notify
    /// listeners outside the lock.
    fn transition(&self, cancel: Option<&CancellationToken>, f: impl FnOnce(&mut ConnectionState)) -> bool {
        let snapshot = {
            let _gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return false;
            }
            self.state.send_modify(f);
            self.state.borrow().clone()
        };
        self.listeners.notify(&snapshot);
        true
    }
}

/// Everything the supervisor task needs.
struct Supervisor {
    transport: Arc<dyn PushTransport>,
    identity: SessionIdentity,
    policy: ReconnectPolicy,
    heartbeat: HeartbeatConfig,
    events: mpsc::Sender<RawPushEvent>,
    metrics: Arc<RealtimeMetrics>,
    shared: Arc<Shared>,
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Manages the session's push connection.
pub struct ConnectionManager {
    supervisor: Arc<Supervisor>,
    running: Mutex<Option<Running>>,
}

impl ConnectionManager {
    /// Creates a new connection manager. Nothing connects until
    /// [`connect`](Self::connect) is called.
    pub fn new(
        transport: Arc<dyn PushTransport>,
        identity: SessionIdentity,
        policy: ReconnectPolicy,
        heartbeat: HeartbeatConfig,
        events: mpsc::Sender<RawPushEvent>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::idle());
        Self {
            supervisor: Arc::new(Supervisor {
                transport,
                identity,
                policy,
                heartbeat,
                events,
                metrics,
                shared: Arc::new(Shared {
                    state,
                    listeners: ListenerRegistry::new(),
                    gate: Mutex::new(()),
                }),
            }),
            running: Mutex::new(None),
        }
    }

    fn running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start connecting. A no-op while a connection is open or being
    /// established; after a terminal failure it starts a fresh attempt
    /// sequence.
    pub fn connect(&self) {
        let mut running = self.running();
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            debug!("connect() ignored: push connection already active");
            return;
        }

        let cancel = CancellationToken::new();
        let supervisor = Arc::clone(&self.supervisor);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { supervisor.run(token).await });
        *running = Some(Running { cancel, handle });
    }

    /// Close the connection and cancel any pending reconnect. Safe to call
    /// repeatedly.
    pub fn disconnect(&self) {
        let previous = self.running().take();
        if let Some(previous) = previous {
            previous.cancel.cancel();
        }

        let shared = &self.supervisor.shared;
        let phase = shared.state.borrow().phase;
        if matches!(phase, ConnectionPhase::Idle | ConnectionPhase::Disconnected) {
            return;
        }
        shared.transition(None, |s| {
            s.phase = ConnectionPhase::Disconnected;
            s.connection_id = None;
        });
        info!("Push connection disconnected");
    }

    /// Drop the current connection and start over with a fresh backoff.
    pub fn force_reconnect(&self) {
        info!("Forcing push reconnect");
        self.disconnect();
        self.connect();
    }

    /// Register a listener called synchronously on every state transition.
    pub fn on_connection_state_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ConnectionState) + Send + Sync + 'static,
    {
        self.supervisor.shared.listeners.subscribe(listener)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.supervisor.shared.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.supervisor.shared.state.subscribe()
    }

    /// Whether the connection is open.
    pub fn is_connected(&self) -> bool {
        self.supervisor.shared.state.borrow().is_connected()
    }

    /// Snapshot of the diagnostic counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.supervisor.metrics.snapshot()
    }

    /// Number of registered state listeners.
    pub fn listener_count(&self) -> usize {
        self.supervisor.shared.listeners.len()
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(running) = self.running().take() {
            running.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state())
            .field("transport", &self.supervisor.transport)
            .finish()
    }
}

impl Supervisor {
    async fn run(&self, cancel: CancellationToken) {
        let mut failures: u32 = 0;

        loop {
            if !self.shared.transition(Some(&cancel), |s| {
                s.phase = ConnectionPhase::Connecting;
                s.reconnect_attempts = failures;
            }) {
                return;
            }
            metrics::connections::record_attempt(&self.metrics);

            let opened = tokio::select! {
                _ = cancel.cancelled() => return,
                opened = self.transport.open(&self.identity) => opened,
            };

            let delay = match opened {
                Ok(channel) => {
                    failures = 0;
                    metrics::connections::record_connected(&self.metrics);
                    let connection_id = Uuid::new_v4();
                    let established = self.shared.transition(Some(&cancel), |s| {
                        s.phase = ConnectionPhase::Connected;
                        s.reconnect_attempts = 0;
                        s.last_error = None;
                        s.last_connected_at = Some(Utc::now());
                        s.connection_id = Some(connection_id);
                    });
                    if !established {
                        let mut channel = channel;
                        channel.close().await;
                        return;
                    }
                    info!(%connection_id, user_id = %self.identity.user_id, "Push connection established");

                    let err = match self.pump(channel, &cancel).await {
                        SessionEnd::Cancelled => return,
                        SessionEnd::Lost(err) => err,
                    };
                    if matches!(err, TransportError::HeartbeatTimeout(_)) {
                        metrics::connections::record_heartbeat_timeout(&self.metrics);
                    }
                    warn!(%connection_id, error = %err, "Push connection lost");
                    self.schedule(&cancel, 0, err)
                }
                Err(err) => {
                    failures += 1;
                    metrics::connections::record_failed(&self.metrics);
                    warn!(attempt = failures, error = %err, "Push connection attempt failed");
                    self.schedule(&cancel, failures, err)
                }
            };

            let Some(delay) = delay else { return };
            debug!(delay_ms = delay.as_millis() as u64, "Scheduling push reconnect");
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Publish the outcome of a failure and return the backoff delay, or
    /// `None` once the attempt budget is spent.
    fn schedule(&self, cancel: &CancellationToken, failures: u32, err: TransportError) -> Option<Duration> {
        match self.policy.next_delay(failures) {
            Some(delay) => {
                self.shared.transition(Some(cancel), |s| {
                    s.phase = ConnectionPhase::Reconnecting;
                    s.reconnect_attempts = failures;
                    s.last_error = Some(err);
                    s.connection_id = None;
                });
                Some(delay)
            }
            None => {
                error!(attempts = failures, error = %err, "Giving up on push connection");
                self.shared.transition(Some(cancel), |s| {
                    s.phase = ConnectionPhase::Failed;
                    s.reconnect_attempts = failures;
                    s.last_error = Some(TransportError::ReconnectExhausted {
                        attempts: failures,
                        last: err.to_string(),
                    });
                    s.connection_id = None;
                });
                None
            }
        }
    }

    /// Read frames until the connection ends, goes stale, or is cancelled.
    async fn pump(&self, mut channel: Box<dyn PushChannel>, cancel: &CancellationToken) -> SessionEnd {
        let mut activity = ActivityTracker::new(self.heartbeat.timeout);
        let mut keepalive = self.heartbeat.keepalive();

        let end = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break SessionEnd::Cancelled,
                _ = heartbeat::stale(activity.deadline()) => {
                    break SessionEnd::Lost(TransportError::HeartbeatTimeout(activity.idle_for()));
                }
                _ = heartbeat::next_keepalive(&mut keepalive) => {
                    if let Err(err) = channel.send_keepalive().await {
                        break SessionEnd::Lost(err);
                    }
                }
                frame = channel.next_frame() => match frame {
                    Some(Ok(PushFrame::Event(event))) => {
                        activity.touch();
                        metrics::messages::record_received(&self.metrics);
                        if self.events.send(event).await.is_err() {
                            debug!("Event dispatcher stopped; dropping push event");
                        }
                    }
                    Some(Ok(PushFrame::Keepalive)) => activity.touch(),
                    Some(Ok(PushFrame::Invalid(reason))) => {
                        activity.touch();
                        metrics::messages::record_dropped(&self.metrics);
                        warn!(%reason, "Dropping undecodable push frame");
                    }
                    Some(Err(err)) => break SessionEnd::Lost(err),
                    None => break SessionEnd::Lost(TransportError::Closed(
                        "server closed the connection".to_string(),
                    )),
                },
            }
        };

        channel.close().await;
        end
    }
}
