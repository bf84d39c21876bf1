//! Fallback polling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the REST polling fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between polls while the push connection is down.
    pub interval_seconds: u64,
    /// Seconds the connection must stay down before polling starts.
    pub grace_period_seconds: u64,
}

impl PollingConfig {
    /// Poll interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }

    /// Grace period as a [`Duration`].
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_seconds)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 30,
            grace_period_seconds: 10,
        }
    }
}
