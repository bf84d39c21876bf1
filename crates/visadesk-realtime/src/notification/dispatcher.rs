//! Event dispatcher: validates push events and applies them to the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::message::types::{NotificationEvent, RawPushEvent};
use crate::message::validator::validate_event;
use crate::metrics::{self, RealtimeMetrics};

use super::store::{ApplyOutcome, MergeOp, NotificationStore};

/// Routes validated push events into the notification store.
#[derive(Debug)]
pub struct EventDispatcher {
    store: Arc<NotificationStore>,
    metrics: Arc<RealtimeMetrics>,
}

impl EventDispatcher {
    /// Create a new dispatcher
    pub fn new(store: Arc<NotificationStore>, metrics: Arc<RealtimeMetrics>) -> Self {
        Self { store, metrics }
    }

    /// Validate and apply one event received now.
    pub fn dispatch(&self, raw: &RawPushEvent) -> Result<ApplyOutcome, ValidationError> {
        self.dispatch_at(raw, Utc::now())
    }

    /// Validate and apply one event received at `received_at`.
    ///
    /// Invalid events are dropped: the error is logged, counted, and
    /// returned for inspection, but the store is untouched.
    pub fn dispatch_at(
        &self,
        raw: &RawPushEvent,
        received_at: DateTime<Utc>,
    ) -> Result<ApplyOutcome, ValidationError> {
        let result = validate_event(raw, received_at).and_then(|event| self.apply(event));
        if let Err(e) = &result {
            metrics::messages::record_dropped(&self.metrics);
            warn!(event = %raw.event, error = %e, "Dropping invalid push event");
        }
        result
    }

    /// Apply a validated event.
    pub fn apply(&self, event: NotificationEvent) -> Result<ApplyOutcome, ValidationError> {
        let id = event.id().clone();
        let kind = event.kind();
        let incomplete = matches!(&event, NotificationEvent::Updated { full: None, .. });

        let op = match event {
            NotificationEvent::Created(notification) => MergeOp::Upsert(notification),
            NotificationEvent::Updated { id, patch, full } => MergeOp::Patch {
                id,
                patch,
                fallback: full,
            },
            NotificationEvent::Deleted(id) => MergeOp::Remove(id),
        };
        let outcome = self.store.apply(op);

        if outcome == ApplyOutcome::Ignored && incomplete && !self.store.is_deleted(&id) {
            return Err(ValidationError::IncompleteUpdate(id));
        }

        debug!(event = kind.event_name(), notification_id = %id, ?outcome, "Push event applied");
        Ok(outcome)
    }

    /// Drain `events` in receipt order until the channel closes or `cancel`
    /// fires.
    pub async fn run(&self, mut events: mpsc::Receiver<RawPushEvent>, cancel: CancellationToken) {
        loop {
            let raw = tokio::select! {
                _ = cancel.cancelled() => break,
                raw = events.recv() => match raw {
                    Some(raw) => raw,
                    None => break,
                },
            };
            let _ = self.dispatch(&raw);
        }
        debug!("Event dispatcher stopped");
    }
}
