//! Requested document entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use visadesk_core::types::id::{DocumentId, LeadId};

/// A document the case team has asked an applicant to provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedDocument {
    /// Document request identifier.
    pub id: DocumentId,
    /// Human-readable document name.
    pub name: String,
    /// Lead the request belongs to.
    pub lead_id: LeadId,
    /// When the document was requested.
    pub requested_at: DateTime<Utc>,
    /// Whether the document has been received.
    #[serde(default)]
    pub received: bool,
}
