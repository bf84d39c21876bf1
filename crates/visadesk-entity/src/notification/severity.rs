//! Notification severity levels.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Visual severity of a notification (`type` on the wire).
///
/// Decoding never fails: anything unrecognised, including a missing or
/// non-string value, falls back to [`NotificationSeverity::Info`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSeverity {
    /// Informational.
    #[default]
    Info,
    /// A completed action.
    Success,
    /// Needs attention.
    Warning,
    /// Something failed.
    Error,
}

impl NotificationSeverity {
    /// All severities.
    pub const ALL: [NotificationSeverity; 4] = [Self::Info, Self::Success, Self::Warning, Self::Error];

    /// Parse a wire value, falling back to `Info`.
    pub fn lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    /// Return the severity as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for NotificationSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown notification severity '{s}'"))
    }
}

impl<'de> Deserialize<'de> for NotificationSeverity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Self::lenient(&s),
            _ => Self::default(),
        })
    }
}
