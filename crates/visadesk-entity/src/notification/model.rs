//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use visadesk_core::types::id::{LeadId, NotificationId};

use super::category::NotificationCategory;
use super::severity::NotificationSeverity;

/// A notification shown to the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Server-assigned identifier, stable across updates.
    pub id: NotificationId,
    /// Notification body text.
    pub message: String,
    /// Notification category.
    pub category: NotificationCategory,
    /// Severity (`type` on the wire).
    #[serde(rename = "type", default)]
    pub severity: NotificationSeverity,
    /// Whether the user has read this notification.
    #[serde(default)]
    pub is_read: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// Deep-link target inside the portal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Lead the notification refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<LeadId>,
}

impl Notification {
    /// Create an unread notification created now.
    pub fn new(
        id: impl Into<NotificationId>,
        message: impl Into<String>,
        category: NotificationCategory,
    ) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            category,
            severity: NotificationSeverity::Info,
            is_read: false,
            created_at: Utc::now(),
            link: None,
            lead_id: None,
        }
    }

    /// Check if the notification has been read.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }
}

/// A partial update carried by a `notification:updated` event.
///
/// Absent fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPatch {
    /// New body text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// New category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<NotificationCategory>,
    /// New severity.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<NotificationSeverity>,
    /// New read flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    /// New deep link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// New lead reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<LeadId>,
}

impl NotificationPatch {
    /// Apply the patch to an existing notification, returning the merged value.
    pub fn apply_to(&self, base: &Notification) -> Notification {
        let mut merged = base.clone();
        if let Some(message) = &self.message {
            merged.message = message.clone();
        }
        if let Some(category) = self.category {
            merged.category = category;
        }
        if let Some(severity) = self.severity {
            merged.severity = severity;
        }
        if let Some(is_read) = self.is_read {
            merged.is_read = is_read;
        }
        if let Some(link) = &self.link {
            merged.link = Some(link.clone());
        }
        if let Some(lead_id) = &self.lead_id {
            merged.lead_id = Some(lead_id.clone());
        }
        merged
    }
}
