//! Requested-document review thresholds.

use serde::{Deserialize, Serialize};

/// Age thresholds used to triage outstanding document requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Days after which an outstanding request becomes priority.
    pub priority_after_days: i64,
    /// Days after which an outstanding request is overdue.
    pub overdue_after_days: i64,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            priority_after_days: 3,
            overdue_after_days: 7,
        }
    }
}
