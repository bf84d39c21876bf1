//! Age-based triage of requested documents.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use visadesk_core::config::ReviewConfig;
use visadesk_entity::RequestedDocument;

/// How urgently a requested document needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewUrgency {
    /// Requested longer ago than the overdue threshold.
    Overdue,
    /// Requested longer ago than the priority threshold.
    Priority,
    /// Recently requested.
    Normal,
    /// Already received.
    Complete,
}

impl ReviewUrgency {
    fn rank(self) -> u8 {
        match self {
            Self::Overdue => 0,
            Self::Priority => 1,
            Self::Normal => 2,
            Self::Complete => 3,
        }
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Priority => "priority",
            Self::Normal => "normal",
            Self::Complete => "complete",
        }
    }
}

impl std::fmt::Display for ReviewUrgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested document with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriagedDocument {
    /// The request.
    pub document: RequestedDocument,
    /// Urgency class.
    pub urgency: ReviewUrgency,
    /// Whole days since the request.
    pub age_days: i64,
}

/// Day thresholds separating normal, priority and overdue requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewPolicy {
    priority_after_days: i64,
    overdue_after_days: i64,
}

impl ReviewPolicy {
    /// Creates a policy. Negative thresholds count as zero and the
    /// priority threshold never exceeds the overdue one.
    pub fn new(priority_after_days: i64, overdue_after_days: i64) -> Self {
        let overdue = overdue_after_days.max(0);
        Self {
            priority_after_days: priority_after_days.clamp(0, overdue),
            overdue_after_days: overdue,
        }
    }

    /// Build from the `review` configuration section.
    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(config.priority_after_days, config.overdue_after_days)
    }

    /// Days after which a request becomes priority.
    pub fn priority_after_days(&self) -> i64 {
        self.priority_after_days
    }

    /// Days after which a request is overdue.
    pub fn overdue_after_days(&self) -> i64 {
        self.overdue_after_days
    }

    /// Classify one request as of `now`.
    pub fn classify(&self, document: &RequestedDocument, now: DateTime<Utc>) -> ReviewUrgency {
        if document.received {
            return ReviewUrgency::Complete;
        }
        let age = age_days(document, now);
        if age >= self.overdue_after_days {
            ReviewUrgency::Overdue
        } else if age >= self.priority_after_days {
            ReviewUrgency::Priority
        } else {
            ReviewUrgency::Normal
        }
    }

    /// Classify and sort: overdue, priority, normal, complete; oldest first
    /// within a class.
    pub fn triage(&self, documents: Vec<RequestedDocument>, now: DateTime<Utc>) -> Vec<TriagedDocument> {
        let mut triaged: Vec<TriagedDocument> = documents
            .into_iter()
            .map(|document| TriagedDocument {
                urgency: self.classify(&document, now),
                age_days: age_days(&document, now),
                document,
            })
            .collect();

        triaged.sort_by(|a, b| {
            a.urgency
                .rank()
                .cmp(&b.urgency.rank())
                .then_with(|| a.document.requested_at.cmp(&b.document.requested_at))
                .then_with(|| a.document.id.cmp(&b.document.id))
        });

        debug!(
            total = triaged.len(),
            overdue = triaged.iter().filter(|t| t.urgency == ReviewUrgency::Overdue).count(),
            "Requested documents triaged"
        );
        triaged
    }
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self::from_config(&ReviewConfig::default())
    }
}

fn age_days(document: &RequestedDocument, now: DateTime<Utc>) -> i64 {
    (now - document.requested_at).num_days().max(0)
}
