//! Delivery preference entity.

use serde::{Deserialize, Serialize};

/// How new notifications are announced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPreferences {
    /// Play a sound for new notifications.
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Show a desktop alert for new notifications.
    #[serde(default = "default_true")]
    pub desktop_enabled: bool,
}

impl DeliveryPreferences {
    /// Apply a partial update.
    pub fn merged(self, patch: &PreferencesPatch) -> Self {
        Self {
            sound_enabled: patch.sound_enabled.unwrap_or(self.sound_enabled),
            desktop_enabled: patch.desktop_enabled.unwrap_or(self.desktop_enabled),
        }
    }

    /// Whether any alert channel is enabled.
    pub fn any_enabled(&self) -> bool {
        self.sound_enabled || self.desktop_enabled
    }
}

impl Default for DeliveryPreferences {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            desktop_enabled: true,
        }
    }
}

/// Partial preference update from the settings screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesPatch {
    /// New sound setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    /// New desktop alert setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop_enabled: Option<bool>,
}

impl PreferencesPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.sound_enabled.is_none() && self.desktop_enabled.is_none()
    }
}

fn default_true() -> bool {
    true
}
