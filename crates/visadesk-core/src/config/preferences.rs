//! Client-side preference persistence configuration.

use serde::{Deserialize, Serialize};

/// Where delivery preferences are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    /// Path of the JSON preferences file.
    pub path: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            path: "data/preferences.json".to_string(),
        }
    }
}
