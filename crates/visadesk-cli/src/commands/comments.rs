//! `comments`: order comments with pinned authors first.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use visadesk_core::error::AppError;
use visadesk_entity::Comment;
use visadesk_service::CommentOrdering;

use crate::output::{self, OutputFormat};

/// Arguments for `comments`
#[derive(Debug, Args)]
pub struct CommentsArgs {
    /// JSON file holding an array of comments
    pub file: PathBuf,
    /// Extra pinned author, in addition to the configured ones
    #[arg(long = "pin")]
    pub pins: Vec<String>,
}

/// Comment display row
#[derive(Debug, Serialize, Tabled)]
struct CommentRow {
    /// Pinned marker
    #[tabled(rename = "")]
    pinned: &'static str,
    /// Author
    author: String,
    /// Comment text
    body: String,
    /// Posted at
    created_at: String,
}

/// Execute `comments`
pub async fn execute(args: &CommentsArgs, config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let ordering = CommentOrdering::new(config.comments.pinned_authors.iter().chain(&args.pins));
    let comments: Vec<Comment> = super::read_json(&args.file).await?;

    let rows: Vec<CommentRow> = ordering
        .sorted(comments)
        .into_iter()
        .map(|c| CommentRow {
            pinned: if ordering.is_pinned(&c.author) { "📌" } else { "" },
            created_at: c.created_at.format("%Y-%m-%d %H:%M").to_string(),
            author: c.author,
            body: c.body,
        })
        .collect();

    output::print_list(&rows, format);
    Ok(())
}
