//! Notification decoding shared by the REST listing and the push channel.
//!
//! Both paths must accept exactly the same bodies, otherwise polling and push
//! disagree about what the server holds. Ids may be strings or numbers,
//! severity falls back to `info`, category matches case-insensitively and a
//! missing `createdAt` takes the time of receipt.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use visadesk_core::types::id::{LeadId, NotificationId};
use visadesk_entity::{Notification, NotificationCategory, NotificationPatch, NotificationSeverity};

/// Longest accepted identifier.
const MAX_ID_LEN: usize = 256;

/// Why a body could not be turned into a notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Not a JSON object, or fields of the wrong JSON type.
    #[error("malformed notification: {0}")]
    Malformed(String),
    /// Well-formed but missing or out-of-range fields.
    #[error("invalid notification fields: {0}")]
    InvalidFields(String),
}

/// Wire shape of a full notification body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct NotificationPayload {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    #[validate(length(min = 1, max = 4096))]
    message: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    category: String,
    #[serde(rename = "type", default)]
    severity: NotificationSeverity,
    #[serde(default)]
    is_read: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(length(max = 2048))]
    link: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 256))]
    lead_id: Option<String>,
}

/// Wire shape of a partial update. Every field is optional.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct PatchPayload {
    #[serde(default)]
    #[validate(length(min = 1, max = 4096))]
    message: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(rename = "type", default)]
    severity: Option<NotificationSeverity>,
    #[serde(default)]
    is_read: Option<bool>,
    #[serde(default)]
    #[validate(length(max = 2048))]
    link: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 256))]
    lead_id: Option<String>,
}

/// Decode a full notification body.
pub fn decode_notification(
    data: &Value,
    received_at: DateTime<Utc>,
) -> Result<Notification, DecodeError> {
    if !data.is_object() {
        return Err(DecodeError::Malformed("payload is not an object".to_string()));
    }
    let payload: NotificationPayload =
        serde_json::from_value(data.clone()).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    payload
        .validate()
        .map_err(|e| DecodeError::InvalidFields(e.to_string()))?;

    let id = id_from_value(&payload.id)
        .ok_or_else(|| DecodeError::InvalidFields("id: missing or blank".to_string()))?;

    Ok(Notification {
        id,
        message: payload.message,
        category: parse_category(&payload.category)?,
        severity: payload.severity,
        is_read: payload.is_read,
        created_at: payload.created_at.unwrap_or(received_at),
        link: payload.link,
        lead_id: payload.lead_id.map(LeadId::from),
    })
}

/// Decode the fields of a partial update. The id is read separately with
/// [`id_from_value`].
pub fn decode_patch(data: &Value) -> Result<NotificationPatch, DecodeError> {
    if !data.is_object() {
        return Err(DecodeError::Malformed("payload is not an object".to_string()));
    }
    let payload: PatchPayload =
        serde_json::from_value(data.clone()).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    payload
        .validate()
        .map_err(|e| DecodeError::InvalidFields(e.to_string()))?;

    Ok(NotificationPatch {
        message: payload.message,
        category: payload.category.as_deref().map(parse_category).transpose()?,
        severity: payload.severity,
        is_read: payload.is_read,
        link: payload.link,
        lead_id: payload.lead_id.map(LeadId::from),
    })
}

/// Ids arrive as strings, but numeric ids are accepted as well.
pub fn id_from_value(value: &Value) -> Option<NotificationId> {
    let id = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty() && id.len() <= MAX_ID_LEN).then(|| NotificationId::new(id))
}

fn parse_category(raw: &str) -> Result<NotificationCategory, DecodeError> {
    raw.parse()
        .map_err(|e: String| DecodeError::InvalidFields(format!("category: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        "2026-03-01T12:00:00Z".parse().expect("timestamp")
    }

    #[test]
    fn test_lenient_body_decodes() {
        let n = decode_notification(
            &json!({ "id": 7, "message": "m", "category": "SYSTEM", "type": "notice" }),
            now(),
        )
        .expect("lenient body");
        assert_eq!(n.id.as_str(), "7");
        assert_eq!(n.category, NotificationCategory::System);
        assert_eq!(n.severity, NotificationSeverity::Info);
        assert_eq!(n.created_at, now());
    }

    #[test]
    fn test_rejections_are_classified() {
        assert!(matches!(
            decode_notification(&json!("n1"), now()),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode_notification(&json!({ "id": "n1", "message": 5, "category": "general" }), now()),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode_notification(&json!({ "id": "n1", "message": "m", "category": "promo" }), now()),
            Err(DecodeError::InvalidFields(msg)) if msg.contains("category")
        ));
        assert!(matches!(
            decode_notification(&json!({ "id": [], "message": "m", "category": "general" }), now()),
            Err(DecodeError::InvalidFields(_))
        ));
    }

    #[test]
    fn test_patch_accepts_unknown_severity() {
        let patch = decode_patch(&json!({ "id": "n1", "type": "urgent", "category": "Messages" }))
            .expect("patch");
        assert_eq!(patch.severity, Some(NotificationSeverity::Info));
        assert_eq!(patch.category, Some(NotificationCategory::Messages));
        assert!(patch.is_read.is_none());
    }
}
