//! Push event type definitions.

use serde::{Deserialize, Serialize};

use visadesk_core::types::id::NotificationId;
use visadesk_entity::{Notification, NotificationPatch};

/// Event name for a newly created notification.
pub const EVENT_CREATED: &str = "notification:new";
/// Event name for a changed notification.
pub const EVENT_UPDATED: &str = "notification:updated";
/// Event name for a deleted notification.
pub const EVENT_DELETED: &str = "notification:deleted";

/// A push frame as received: an event name plus an unvalidated payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPushEvent {
    /// Event name, e.g. `notification:new`.
    pub event: String,
    /// Event payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl RawPushEvent {
    /// Create a raw event.
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// `notification:new` carrying the full notification.
    pub fn created(notification: &Notification) -> Self {
        Self::new(EVENT_CREATED, serde_json::to_value(notification).unwrap_or_default())
    }

    /// `notification:updated` carrying the full notification.
    pub fn updated(notification: &Notification) -> Self {
        Self::new(EVENT_UPDATED, serde_json::to_value(notification).unwrap_or_default())
    }

    /// `notification:deleted` for `id`.
    pub fn deleted(id: &NotificationId) -> Self {
        Self::new(EVENT_DELETED, serde_json::json!({ "id": id }))
    }
}

/// The three notification events the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushEventKind {
    /// `notification:new`
    Created,
    /// `notification:updated`
    Updated,
    /// `notification:deleted`
    Deleted,
}

impl PushEventKind {
    /// Map a wire event name to its kind.
    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            EVENT_CREATED => Some(Self::Created),
            EVENT_UPDATED => Some(Self::Updated),
            EVENT_DELETED => Some(Self::Deleted),
            _ => None,
        }
    }

    /// Wire event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Created => EVENT_CREATED,
            Self::Updated => EVENT_UPDATED,
            Self::Deleted => EVENT_DELETED,
        }
    }
}

/// A validated notification event.
#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    /// A new notification.
    Created(Notification),
    /// Changes to an existing notification.
    Updated {
        /// Target notification.
        id: NotificationId,
        /// Fields present in the payload.
        patch: NotificationPatch,
        /// The payload as a full notification, when it carries every
        /// required field.
        full: Option<Notification>,
    },
    /// A removed notification.
    Deleted(NotificationId),
}

impl NotificationEvent {
    /// Identifier of the affected notification.
    pub fn id(&self) -> &NotificationId {
        match self {
            Self::Created(n) => &n.id,
            Self::Updated { id, .. } => id,
            Self::Deleted(id) => id,
        }
    }

    /// Kind of the event.
    pub fn kind(&self) -> PushEventKind {
        match self {
            Self::Created(_) => PushEventKind::Created,
            Self::Updated { .. } => PushEventKind::Updated,
            Self::Deleted(_) => PushEventKind::Deleted,
        }
    }
}
