//! Push event validation rules.

use chrono::{DateTime, Utc};
use serde_json::Value;

use visadesk_client::wire::{decode_notification, decode_patch, id_from_value};
use visadesk_core::types::id::NotificationId;
use visadesk_entity::Notification;

use super::types::{NotificationEvent, PushEventKind, RawPushEvent};
use crate::error::ValidationError;

/// Maximum allowed frame size in bytes.
pub const MAX_FRAME_SIZE: usize = 65_536;

/// Validates a raw text frame before it is decoded.
pub fn validate_frame(raw: &str) -> Result<(), ValidationError> {
    if raw.len() > MAX_FRAME_SIZE {
        return Err(ValidationError::Malformed(format!(
            "frame exceeds maximum size of {MAX_FRAME_SIZE} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(ValidationError::Malformed("empty frame".to_string()));
    }

    Ok(())
}

/// Turn a raw push event into a typed event.
///
/// `received_at` stands in for a missing `createdAt`.
pub fn validate_event(
    raw: &RawPushEvent,
    received_at: DateTime<Utc>,
) -> Result<NotificationEvent, ValidationError> {
    let kind = PushEventKind::from_event_name(&raw.event)
        .ok_or_else(|| ValidationError::UnknownEvent(raw.event.clone()))?;

    match kind {
        PushEventKind::Created => parse_full(&raw.data, received_at).map(NotificationEvent::Created),
        PushEventKind::Updated => parse_update(&raw.data, received_at),
        PushEventKind::Deleted => parse_id_only(&raw.data).map(NotificationEvent::Deleted),
    }
}

fn parse_full(data: &Value, received_at: DateTime<Utc>) -> Result<Notification, ValidationError> {
    Ok(decode_notification(data, received_at)?)
}

fn parse_update(data: &Value, received_at: DateTime<Utc>) -> Result<NotificationEvent, ValidationError> {
    let id = data
        .get("id")
        .and_then(id_from_value)
        .ok_or_else(|| ValidationError::InvalidFields("id: missing or blank".to_string()))?;
    let patch = decode_patch(data)?;
    let full = parse_full(data, received_at).ok();

    Ok(NotificationEvent::Updated { id, patch, full })
}

fn parse_id_only(data: &Value) -> Result<NotificationId, ValidationError> {
    let id = match data {
        Value::Object(map) => map
            .get("id")
            .or_else(|| map.get("notificationId"))
            .and_then(id_from_value),
        other => id_from_value(other),
    };
    id.ok_or_else(|| ValidationError::InvalidFields("id: missing or blank".to_string()))
}
