//! Comment entity attached to a lead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use visadesk_core::types::id::CommentId;

/// A comment left on a visa application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment identifier.
    pub id: CommentId,
    /// Author identity (email or username).
    pub author: String,
    /// Comment text.
    pub body: String,
    /// When the comment was posted.
    pub created_at: DateTime<Utc>,
}
