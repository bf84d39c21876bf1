//! Notification engine: one isolated instance per signed-in session.

use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use visadesk_client::{ApiResult, NotificationApi};
use visadesk_core::config::AppConfig;
use visadesk_core::result::AppResult;
use visadesk_core::types::id::NotificationId;
use visadesk_entity::{DeliveryPreferences, Notification, PreferencesPatch};

use crate::connection::backoff::ReconnectPolicy;
use crate::connection::heartbeat::HeartbeatConfig;
use crate::connection::manager::ConnectionManager;
use crate::connection::state::ConnectionState;
use crate::connection::transport::{PushTransport, SessionIdentity};
use crate::error::MutationError;
use crate::metrics::{MetricsSnapshot, RealtimeMetrics};
use crate::mutation::gateway::MutationGateway;
use crate::notification::alert::{AlertSink, run_alerts};
use crate::notification::dispatcher::EventDispatcher;
use crate::notification::preferences::PreferenceStore;
use crate::notification::reconcile::{ReconcileReport, Reconciler};
use crate::notification::store::{NotificationStore, StoreChange, StoreSnapshot};
use crate::observer::Subscription;
use crate::poller::{FallbackPoller, PollerState};

/// The notification engine of one session.
///
/// Owns the push connection, the store, the poller and every background
/// task. Nothing is global: two engines never share state.
pub struct NotificationEngine {
    store: Arc<NotificationStore>,
    connection: ConnectionManager,
    poller: Arc<FallbackPoller>,
    reconciler: Arc<Reconciler>,
    gateway: MutationGateway,
    metrics: Arc<RealtimeMetrics>,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl NotificationEngine {
    /// Build and start an engine.
    ///
    /// Loads preferences, performs the initial load, starts the background
    /// tasks and connects. A failed initial load is logged and left to the
    /// poller and the reconnect refresh.
    pub async fn init(
        config: &AppConfig,
        identity: SessionIdentity,
        api: Arc<dyn NotificationApi>,
        transport: Arc<dyn PushTransport>,
        preference_store: Arc<dyn PreferenceStore>,
        alert_sink: Arc<dyn AlertSink>,
    ) -> AppResult<Self> {
        let buffer = config.realtime.event_buffer_size.max(1);
        let metrics = Arc::new(RealtimeMetrics::new());
        let store = Arc::new(NotificationStore::load(preference_store, buffer).await?);
        let reconciler = Arc::new(Reconciler::new(api.clone(), store.clone(), config.api.page_size));

        match reconciler.reload().await {
            Ok(count) => info!(count, "Initial notifications loaded"),
            Err(e) => warn!(error = %e, "Initial load failed; will retry once connected or polling"),
        }

        let (events_tx, events_rx) = mpsc::channel(buffer);
        let connection = ConnectionManager::new(
            transport,
            identity,
            ReconnectPolicy::from_config(&config.realtime),
            HeartbeatConfig::from_config(&config.realtime),
            events_tx,
            metrics.clone(),
        );
        let dispatcher = Arc::new(EventDispatcher::new(store.clone(), metrics.clone()));
        let poller = Arc::new(FallbackPoller::new(
            reconciler.clone(),
            config.polling.clone(),
            metrics.clone(),
        ));
        let settle = Arc::new(Notify::new());
        let gateway = MutationGateway::new(api, store.clone(), settle.clone(), metrics.clone());
        let cancel = CancellationToken::new();

        let mut tasks = Vec::with_capacity(4);
        {
            let dispatcher = dispatcher.clone();
            let token = cancel.clone();
            tasks.push(tokio::spawn(async move { dispatcher.run(events_rx, token).await }));
        }
        {
            let poller = poller.clone();
            let states = connection.watch_state();
            let token = cancel.clone();
            tasks.push(tokio::spawn(async move { poller.run(states, token).await }));
        }
        tasks.push(tokio::spawn(run_alerts(
            store.subscribe(),
            store.clone(),
            alert_sink,
            cancel.clone(),
        )));
        tasks.push(tokio::spawn(settle_loop(reconciler.clone(), settle.clone(), cancel.clone())));

        let subscriptions = vec![
            connection.on_connection_state_change(|state| {
                debug!(
                    phase = %state.phase,
                    attempts = state.reconnect_attempts,
                    error = ?state.last_error,
                    "Connection state changed"
                );
            }),
            // Catch up on anything missed while the connection was down.
            connection.on_connection_state_change(move |state| {
                if state.is_connected() {
                    settle.notify_one();
                }
            }),
        ];

        connection.connect();
        info!("Notification engine started");

        Ok(Self {
            store,
            connection,
            poller,
            reconciler,
            gateway,
            metrics,
            cancel,
            tasks: Mutex::new(tasks),
            subscriptions: Mutex::new(subscriptions),
        })
    }

    /// Stop every task, close the connection and drop owned listeners.
    /// Safe to call more than once.
    pub async fn teardown(&self) {
        self.cancel.cancel();
        self.connection.disconnect();

        let subscriptions = std::mem::take(&mut *self.subscriptions.lock().unwrap_or_else(|e| e.into_inner()));
        for subscription in subscriptions {
            subscription.unsubscribe();
        }

        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(|e| e.into_inner()));
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Engine task ended abnormally");
            }
        }
        info!("Notification engine stopped");
    }

    // Presentation interface.

    /// Notifications, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.store.notifications()
    }

    /// Number of unread notifications.
    pub fn unread_count(&self) -> usize {
        self.store.unread_count()
    }

    /// Whether a full load is in progress.
    pub fn is_loading(&self) -> bool {
        self.store.is_loading()
    }

    /// Consistent view for rendering.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Change feed of the store.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.store.subscribe()
    }

    /// Current push connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Register a connection state listener.
    pub fn on_connection_state_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ConnectionState) + Send + Sync + 'static,
    {
        self.connection.on_connection_state_change(listener)
    }

    /// Receiver for connection state changes.
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.watch_state()
    }

    /// Current poller state.
    pub fn poller_state(&self) -> PollerState {
        self.poller.state()
    }

    /// Receiver for poller state changes.
    pub fn watch_poller(&self) -> watch::Receiver<PollerState> {
        self.poller.watch_state()
    }

    /// Diagnostic counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Current delivery preferences.
    pub fn preferences(&self) -> DeliveryPreferences {
        self.store.preferences()
    }

    /// The push connection.
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    // Actions.

    /// Mark one notification as read.
    pub async fn mark_as_read(&self, id: &NotificationId) -> Result<(), MutationError> {
        self.gateway.mark_as_read(id).await
    }

    /// Mark every notification as read.
    pub async fn mark_all_as_read(&self) -> Result<(), MutationError> {
        self.gateway.mark_all_as_read().await
    }

    /// Delete one notification.
    pub async fn delete(&self, id: &NotificationId) -> Result<(), MutationError> {
        self.gateway.delete(id).await
    }

    /// Reconnect now with a fresh backoff.
    pub fn force_reconnect(&self) {
        self.connection.force_reconnect();
    }

    /// Update and persist delivery preferences.
    pub async fn set_preferences(&self, patch: PreferencesPatch) -> AppResult<DeliveryPreferences> {
        self.store.set_preferences(patch).await
    }

    /// Reconcile with the server listing now.
    pub async fn refresh(&self) -> ApiResult<ReconcileReport> {
        self.reconciler.sync().await
    }
}

impl Drop for NotificationEngine {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for NotificationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationEngine")
            .field("store", &self.store)
            .field("connection", &self.connection)
            .field("poller", &self.poller.state())
            .finish()
    }
}

/// Refresh from the server whenever a mutation or reconnect asks for it.
async fn settle_loop(reconciler: Arc<Reconciler>, settle: Arc<Notify>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = settle.notified() => {}
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            result = reconciler.sync() => {
                if let Err(e) = result {
                    debug!(error = %e, "Settle refresh failed");
                }
            }
        }
    }
}
