//! Mutation gateway: optimistic mark-read, mark-all-read and delete.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use visadesk_client::{ApiError, NotificationApi};
use visadesk_core::types::id::NotificationId;

use crate::error::MutationError;
use crate::metrics::{self, RealtimeMetrics};
use crate::notification::store::NotificationStore;

use super::transaction::{MutationScope, OptimisticTransaction};

/// Applies user actions to the store immediately and confirms them with the
/// server, rolling back on failure.
#[derive(Debug)]
pub struct MutationGateway {
    api: Arc<dyn NotificationApi>,
    store: Arc<NotificationStore>,
    settle: Arc<Notify>,
    metrics: Arc<RealtimeMetrics>,
}

impl MutationGateway {
    /// Creates a gateway. `settle` is notified after every mutation so a
    /// background refresh can converge the store with the server.
    pub fn new(
        api: Arc<dyn NotificationApi>,
        store: Arc<NotificationStore>,
        settle: Arc<Notify>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            api,
            store,
            settle,
            metrics,
        }
    }

    /// Mark one notification as read.
    pub async fn mark_as_read(&self, id: &NotificationId) -> Result<(), MutationError> {
        let tx = OptimisticTransaction::begin(&*self.store, MutationScope::Read(id.clone()));
        tx.apply(|store| store.mark_read(id));

        let outcome = match self.api.mark_read(id, true).await {
            Ok(server_copy) => {
                tx.commit();
                if let Some(server_copy) = server_copy.filter(|n| &n.id == id) {
                    self.store.upsert(server_copy);
                }
                Ok(())
            }
            Err(ApiError::NotFound(_)) => {
                tx.commit();
                debug!(notification_id = %id, "Notification already gone on server");
                self.store.remove(id);
                Ok(())
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        };
        self.finish("mark_read", Some(id), outcome)
    }

    /// Mark every notification as read.
    pub async fn mark_all_as_read(&self) -> Result<(), MutationError> {
        let tx = OptimisticTransaction::begin(&*self.store, MutationScope::All);
        let changed = tx.apply(|store| store.mark_all_read());

        let outcome = match self.api.mark_all_read().await {
            Ok(updated) => {
                tx.commit();
                debug!(local = changed, server = ?updated, "Marked all notifications read");
                Ok(())
            }
            Err(ApiError::NotFound(_)) => {
                tx.commit();
                Ok(())
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        };
        self.finish("mark_all_read", None, outcome)
    }

    /// Delete one notification.
    pub async fn delete(&self, id: &NotificationId) -> Result<(), MutationError> {
        let tx = OptimisticTransaction::begin(&*self.store, MutationScope::Delete(id.clone()));
        tx.apply(|store| store.remove(id));

        let outcome = match self.api.delete(id).await {
            Ok(()) | Err(ApiError::NotFound(_)) => {
                tx.commit();
                Ok(())
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        };
        self.finish("delete", Some(id), outcome)
    }

    /// Record the outcome, request a settle refresh, and map the error.
    fn finish(
        &self,
        action: &'static str,
        id: Option<&NotificationId>,
        outcome: Result<(), ApiError>,
    ) -> Result<(), MutationError> {
        self.settle.notify_one();
        match outcome {
            Ok(()) => {
                metrics::sync::record_commit(&self.metrics);
                info!(action, notification_id = ?id.map(NotificationId::as_str), "Mutation confirmed");
                Ok(())
            }
            Err(e) => {
                metrics::sync::record_rollback(&self.metrics);
                warn!(action, notification_id = ?id.map(NotificationId::as_str), error = %e, "Mutation failed; rolled back");
                Err(MutationError::from(e))
            }
        }
    }
}
