//! Integration tests for the fallback poller state machine.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tokio_util::sync::CancellationToken;

use visadesk_client::ApiError;
use visadesk_core::config::PollingConfig;
use visadesk_realtime::metrics::RealtimeMetrics;
use visadesk_realtime::notification::reconcile::Reconciler;
use visadesk_realtime::{ConnectionPhase, ConnectionState, FallbackPoller, NotificationStore, PollerState};

use helpers::MockApi;

fn with_phase(phase: ConnectionPhase) -> ConnectionState {
    ConnectionState {
        phase,
        ..ConnectionState::idle()
    }
}

struct Harness {
    api: Arc<MockApi>,
    store: Arc<NotificationStore>,
    poller: Arc<FallbackPoller>,
    metrics: Arc<RealtimeMetrics>,
    connection: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

impl Harness {
    fn start(api: Arc<MockApi>) -> Self {
        let store = helpers::store();
        let metrics = Arc::new(RealtimeMetrics::new());
        let reconciler = Arc::new(Reconciler::new(api.clone(), store.clone(), 50));
        let config = PollingConfig {
            interval_seconds: 30,
            grace_period_seconds: 10,
        };
        let poller = Arc::new(FallbackPoller::new(reconciler, config, metrics.clone()));
        let (connection, states) = watch::channel(with_phase(ConnectionPhase::Connected));
        let cancel = CancellationToken::new();

        let task_poller = poller.clone();
        let token = cancel.clone();
        tokio::spawn(async move { task_poller.run(states, token).await });

        Self {
            api,
            store,
            poller,
            metrics,
            connection,
            cancel,
        }
    }

    fn report(&self, phase: ConnectionPhase) {
        self.connection.send_replace(with_phase(phase));
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[tokio::test(start_paused = true)]
async fn test_polling_starts_after_grace_and_stops_on_reconnect() {
    let api = MockApi::with_items(vec![helpers::note("a")]);
    let harness = Harness::start(api.clone());
    let mut poller_states = harness.poller.watch_state();

    harness.report(ConnectionPhase::Reconnecting);
    time::sleep(Duration::from_secs(9)).await;
    assert_eq!(harness.poller.state(), PollerState::Idle);
    assert_eq!(api.list_calls(), 0);

    // First poll fires as soon as the grace period ends.
    time::sleep(Duration::from_secs(2)).await;
    assert_eq!(harness.poller.state(), PollerState::Polling);
    assert_eq!(api.list_calls(), 1);
    assert_eq!(harness.store.len(), 1);

    // Then once per interval: 10s, 40s, 70s.
    time::sleep(Duration::from_secs(64)).await;
    assert_eq!(api.list_calls(), 3);

    harness.report(ConnectionPhase::Connected);
    time::sleep(Duration::from_millis(1)).await;
    assert_eq!(harness.poller.state(), PollerState::Idle);

    // The next scheduled tick is cancelled.
    time::sleep(Duration::from_secs(120)).await;
    assert_eq!(api.list_calls(), 3);

    let metrics = harness.metrics.snapshot();
    assert_eq!(metrics.fallback_activations, 1);
    assert_eq!(metrics.polls_issued, 3);
    assert_eq!(metrics.polls_failed, 0);

    // Observed transitions: Idle -> Polling -> Idle, exactly once.
    assert!(poller_states.has_changed().unwrap_or(false));
    assert_eq!(*poller_states.borrow_and_update(), PollerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_brief_disconnect_does_not_poll() {
    let api = MockApi::new();
    let harness = Harness::start(api.clone());

    harness.report(ConnectionPhase::Reconnecting);
    time::sleep(Duration::from_secs(3)).await;
    harness.report(ConnectionPhase::Connecting);
    time::sleep(Duration::from_secs(3)).await;
    harness.report(ConnectionPhase::Connected);
    time::sleep(Duration::from_secs(60)).await;

    assert_eq!(harness.poller.state(), PollerState::Idle);
    assert_eq!(api.list_calls(), 0);
    assert_eq!(harness.metrics.snapshot().fallback_activations, 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_polls_keep_polling() {
    let api = MockApi::new();
    api.fail_lists(Some(ApiError::Network("offline".into())));
    let harness = Harness::start(api.clone());

    harness.report(ConnectionPhase::Failed);
    time::sleep(Duration::from_secs(11)).await;
    assert_eq!(harness.poller.state(), PollerState::Polling);
    time::sleep(Duration::from_secs(60)).await;
    assert_eq!(api.list_calls(), 3);

    api.fail_lists(None);
    api.set_items(vec![helpers::note("late")]);
    time::sleep(Duration::from_secs(30)).await;
    assert_eq!(api.list_calls(), 4);
    assert!(harness.store.get(&"late".into()).is_some());

    let metrics = harness.metrics.snapshot();
    assert_eq!(metrics.polls_issued, 4);
    assert_eq!(metrics.polls_failed, 3);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_polling() {
    let api = MockApi::new();
    let harness = Harness::start(api.clone());

    harness.report(ConnectionPhase::Disconnected);
    time::sleep(Duration::from_secs(11)).await;
    assert_eq!(api.list_calls(), 1);

    harness.cancel.cancel();
    time::sleep(Duration::from_millis(1)).await;
    assert_eq!(harness.poller.state(), PollerState::Idle);
    time::sleep(Duration::from_secs(120)).await;
    assert_eq!(api.list_calls(), 1);
}
