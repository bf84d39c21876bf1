//! Persistence of the user's delivery preferences.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{debug, warn};

use visadesk_core::config::PreferencesConfig;
use visadesk_core::error::AppError;
use visadesk_core::result::AppResult;
use visadesk_entity::DeliveryPreferences;

/// Loads and saves delivery preferences across restarts.
#[async_trait]
pub trait PreferenceStore: Send + Sync + std::fmt::Debug + 'static {
    /// Load the saved preferences, or the defaults when nothing was saved.
    async fn load(&self) -> AppResult<DeliveryPreferences>;

    /// Persist `preferences`.
    async fn save(&self, preferences: &DeliveryPreferences) -> AppResult<()>;
}

/// Stores preferences as a JSON file.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    /// Creates a store backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store from the preferences configuration section.
    pub fn from_config(config: &PreferencesConfig) -> Self {
        Self::new(&config.path)
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn load(&self) -> AppResult<DeliveryPreferences> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No saved preferences; using defaults");
                return Ok(DeliveryPreferences::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&raw) {
            Ok(preferences) => Ok(preferences),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt preferences file; using defaults");
                Ok(DeliveryPreferences::default())
            }
        }
    }

    async fn save(&self, preferences: &DeliveryPreferences) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_vec_pretty(preferences)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            AppError::persistence(format!(
                "Failed to replace {}: {e}",
                self.path.display()
            ))
        })?;
        debug!(path = %self.path.display(), "Preferences saved");
        Ok(())
    }
}

/// In-memory preference store for sessions that must not touch disk.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    saved: Mutex<Option<DeliveryPreferences>>,
}

impl MemoryPreferenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `preferences`.
    pub fn with(preferences: DeliveryPreferences) -> Self {
        Self {
            saved: Mutex::new(Some(preferences)),
        }
    }

    /// The last saved value, if any.
    pub fn saved(&self) -> Option<DeliveryPreferences> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn load(&self) -> AppResult<DeliveryPreferences> {
        Ok(self.saved().unwrap_or_default())
    }

    async fn save(&self, preferences: &DeliveryPreferences) -> AppResult<()> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(*preferences);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_round_trips_and_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FilePreferenceStore::new(dir.path().join("nested").join("prefs.json"));

        assert_eq!(store.load().await.expect("load"), DeliveryPreferences::default());

        let prefs = DeliveryPreferences {
            sound_enabled: false,
            desktop_enabled: true,
        };
        store.save(&prefs).await.expect("save");
        assert_eq!(store.load().await.expect("load"), prefs);
    }

    #[tokio::test]
    async fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, b"{not json").expect("write");

        let store = FilePreferenceStore::new(&path);
        assert_eq!(store.load().await.expect("load"), DeliveryPreferences::default());
    }
}
