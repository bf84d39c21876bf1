//! CLI command definitions and dispatch.

pub mod comments;
pub mod config;
pub mod notification;
pub mod prefs;
pub mod review;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;

use visadesk_client::HttpNotificationApi;
use visadesk_core::config::AppConfig;
use visadesk_core::error::AppError;

use crate::output::OutputFormat;

/// VisaDesk: live notifications for the visa application portal
#[derive(Debug, Parser)]
#[command(name = "visadesk", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Follow notifications live until Ctrl-C
    Watch(watch::WatchArgs),
    /// List notifications
    List(notification::ListArgs),
    /// Mark one notification as read
    Read(notification::IdArgs),
    /// Mark every notification as read
    ReadAll(notification::ReadAllArgs),
    /// Delete one notification
    Delete(notification::IdArgs),
    /// Delivery preferences
    Prefs(prefs::PrefsArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// Triage requested documents from a JSON file
    Review(review::ReviewArgs),
    /// Order comments from a JSON file
    Comments(comments::CommentsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Watch(args) => watch::execute(args, &self.config).await,
            Commands::List(args) => notification::list(args, &self.config, self.format).await,
            Commands::Read(args) => notification::read(args, &self.config).await,
            Commands::ReadAll(args) => notification::read_all(args, &self.config).await,
            Commands::Delete(args) => notification::delete(args, &self.config).await,
            Commands::Prefs(args) => prefs::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
            Commands::Review(args) => review::execute(args, &self.config, self.format).await,
            Commands::Comments(args) => comments::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: REST client for the configured session
pub fn create_api(config: &AppConfig) -> Result<Arc<HttpNotificationApi>, AppError> {
    config.session.require_token()?;
    Ok(Arc::new(HttpNotificationApi::new(&config.api, &config.session)?))
}

/// Helper: read a JSON array from a file
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, AppError> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::not_found(format!("Cannot read '{}': {}", path.display(), e)))?;
    Ok(serde_json::from_slice(&raw)?)
}
