//! One-shot notification commands: list, read, read-all, delete.

use std::sync::Arc;

use clap::Args;
use dialoguer::Confirm;
use tokio::sync::Notify;

use visadesk_core::error::AppError;
use visadesk_core::types::id::NotificationId;
use visadesk_entity::{DeliveryPreferences, NotificationCategory};
use visadesk_realtime::metrics::RealtimeMetrics;
use visadesk_realtime::notification::reconcile::Reconciler;
use visadesk_realtime::notification::store::DEFAULT_CHANGE_BUFFER;
use visadesk_realtime::{MemoryPreferenceStore, MutationError, MutationGateway, NotificationStore};

use crate::output::{self, NotificationRow, OutputFormat};

/// Arguments for `list`
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only unread notifications
    #[arg(short, long)]
    pub unread: bool,
    /// Filter by category
    #[arg(long)]
    pub category: Option<NotificationCategory>,
    /// Maximum number of rows
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for commands targeting one notification
#[derive(Debug, Args)]
pub struct IdArgs {
    /// Notification ID
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `read-all`
#[derive(Debug, Args)]
pub struct ReadAllArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Store loaded from the server plus a gateway over it.
struct Session {
    store: Arc<NotificationStore>,
    gateway: MutationGateway,
}

async fn open(config_path: &str) -> Result<Session, AppError> {
    let config = super::load_config(config_path)?;
    let api = super::create_api(&config)?;
    let store = Arc::new(NotificationStore::new(
        Arc::new(MemoryPreferenceStore::new()),
        DeliveryPreferences::default(),
        DEFAULT_CHANGE_BUFFER,
    ));
    let count = Reconciler::new(api.clone(), store.clone(), config.api.page_size)
        .reload()
        .await?;
    tracing::debug!(count, "Loaded notifications");

    let gateway = MutationGateway::new(
        api,
        store.clone(),
        Arc::new(Notify::new()),
        Arc::new(RealtimeMetrics::new()),
    );
    Ok(Session { store, gateway })
}

fn confirm(prompt: &str, assume_yes: bool) -> Result<bool, AppError> {
    if assume_yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::internal(format!("Prompt failed: {}", e)))
}

fn report(result: Result<(), MutationError>, done: &str) -> Result<(), AppError> {
    match result {
        Ok(()) => {
            output::print_success(done);
            Ok(())
        }
        Err(e) => {
            output::print_error(e.user_message());
            Err(e.into())
        }
    }
}

/// Execute `list`
pub async fn list(args: &ListArgs, config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let session = open(config_path).await?;

    let rows: Vec<NotificationRow> = session
        .store
        .notifications()
        .iter()
        .filter(|n| !args.unread || n.is_unread())
        .filter(|n| args.category.is_none_or(|c| n.category == c))
        .take(args.limit.unwrap_or(usize::MAX))
        .map(NotificationRow::from)
        .collect();

    output::print_list(&rows, format);
    if format == OutputFormat::Table {
        output::print_kv("Unread", &session.store.unread_count().to_string());
    }
    Ok(())
}

/// Execute `read`
pub async fn read(args: &IdArgs, config_path: &str) -> Result<(), AppError> {
    let session = open(config_path).await?;
    let id = NotificationId::new(args.id.as_str());
    if session.store.get(&id).is_none() {
        output::print_warning(&format!("Notification '{}' is not in the current list", id));
    }
    let result = session.gateway.mark_as_read(&id).await;
    report(result, &format!("Notification '{}' marked as read", id))
}

/// Execute `read-all`
pub async fn read_all(args: &ReadAllArgs, config_path: &str) -> Result<(), AppError> {
    let session = open(config_path).await?;
    let unread = session.store.unread_count();
    if unread == 0 {
        output::print_success("Nothing unread");
        return Ok(());
    }
    if !confirm(&format!("Mark {} notifications as read?", unread), args.yes)? {
        output::print_warning("Cancelled");
        return Ok(());
    }
    let result = session.gateway.mark_all_as_read().await;
    report(result, &format!("{} notifications marked as read", unread))
}

/// Execute `delete`
pub async fn delete(args: &IdArgs, config_path: &str) -> Result<(), AppError> {
    let session = open(config_path).await?;
    let id = NotificationId::new(args.id.as_str());
    if let Some(n) = session.store.get(&id) {
        output::print_kv("Message", &n.message);
    }
    if !confirm(&format!("Delete notification '{}'?", id), args.yes)? {
        output::print_warning("Cancelled");
        return Ok(());
    }
    let result = session.gateway.delete(&id).await;
    report(result, &format!("Notification '{}' deleted", id))
}
