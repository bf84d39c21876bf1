//! Request and response bodies of the notification REST surface.

use serde::{Deserialize, Serialize};

use visadesk_core::types::id::NotificationId;

/// Body of `PUT /notifications/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    /// Target notification.
    pub notification_id: NotificationId,
    /// New read flag.
    pub is_read: bool,
}

/// Body of `DELETE /notifications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    /// Target notification.
    pub notification_id: NotificationId,
}

/// Response of `POST /notifications/read-all`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    /// Number of notifications that changed.
    #[serde(default)]
    pub updated: Option<u64>,
}

/// Error body returned by the backend on failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Alternative field name used by some endpoints.
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best-effort message extraction from a raw response body.
    pub fn message_from(raw: &str) -> String {
        serde_json::from_str::<ErrorBody>(raw)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| raw.chars().take(200).collect())
    }
}
