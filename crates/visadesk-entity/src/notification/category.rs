//! Notification category enumeration.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Category of a notification. The set is closed: the server never sends
/// anything else, so an unknown value marks a malformed event. Matching is
/// case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Anything not covered by a more specific category.
    General,
    /// Chat and comment messages.
    Messages,
    /// Document requests, uploads and quality checks.
    Documents,
    /// Visa application status changes.
    Applications,
    /// System-level announcements.
    System,
}

impl NotificationCategory {
    /// All categories in display order.
    pub const ALL: [NotificationCategory; 5] = [
        Self::General,
        Self::Messages,
        Self::Documents,
        Self::Applications,
        Self::System,
    ];

    /// Return the category as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Messages => "messages",
            Self::Documents => "documents",
            Self::Applications => "applications",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown notification category '{s}'"))
    }
}

impl<'de> Deserialize<'de> for NotificationCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
