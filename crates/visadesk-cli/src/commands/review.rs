//! `review`: triage requested documents.

use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use visadesk_core::error::AppError;
use visadesk_entity::RequestedDocument;
use visadesk_service::{ReviewPolicy, ReviewUrgency, TriagedDocument};

use crate::output::{self, OutputFormat};

/// Arguments for `review`
#[derive(Debug, Args)]
pub struct ReviewArgs {
    /// JSON file holding an array of requested documents
    pub file: PathBuf,
    /// Hide received documents
    #[arg(long)]
    pub outstanding: bool,
}

/// Review display row
#[derive(Debug, Serialize, Tabled)]
struct ReviewRow {
    /// Urgency
    urgency: ReviewUrgency,
    /// Document
    name: String,
    /// Lead
    lead: String,
    /// Days since requested
    age_days: i64,
    /// Requested at
    requested_at: String,
}

impl From<&TriagedDocument> for ReviewRow {
    fn from(t: &TriagedDocument) -> Self {
        Self {
            urgency: t.urgency,
            name: t.document.name.clone(),
            lead: t.document.lead_id.to_string(),
            age_days: t.age_days,
            requested_at: t.document.requested_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Execute `review`
pub async fn execute(args: &ReviewArgs, config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let policy = ReviewPolicy::from_config(&config.review);
    let documents: Vec<RequestedDocument> = super::read_json(&args.file).await?;

    let rows: Vec<ReviewRow> = policy
        .triage(documents, Utc::now())
        .iter()
        .filter(|t| !args.outstanding || t.urgency != ReviewUrgency::Complete)
        .map(ReviewRow::from)
        .collect();

    output::print_list(&rows, format);
    Ok(())
}
