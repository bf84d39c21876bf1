//! Comment ordering configuration.

use serde::{Deserialize, Serialize};

/// Comment ordering policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// Author identities whose comments are always listed first, in this order.
    pub pinned_authors: Vec<String>,
}
