//! REST surface configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the notification REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every REST path is resolved against.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_seconds: u64,
    /// Page size used for list requests (initial load, refresh, polls).
    pub page_size: u64,
}

impl ApiConfig {
    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            request_timeout_seconds: 15,
            page_size: 100,
        }
    }
}
