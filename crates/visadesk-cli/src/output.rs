//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use visadesk_entity::Notification;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{:#?}", item),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}

/// Notification display row
#[derive(Debug, Serialize, Tabled)]
pub struct NotificationRow {
    /// Notification ID
    pub id: String,
    /// Unread marker
    #[tabled(rename = "")]
    pub unread: &'static str,
    /// Severity
    pub severity: String,
    /// Category
    pub category: String,
    /// Message
    pub message: String,
    /// Created at
    pub created_at: String,
}

impl From<&Notification> for NotificationRow {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id.to_string(),
            unread: if n.is_unread() { "●" } else { "" },
            severity: n.severity.as_str().to_string(),
            category: n.category.as_str().to_string(),
            message: n.message.clone(),
            created_at: n.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// One-line rendering used by `watch`.
pub fn notification_line(n: &Notification) -> String {
    format!(
        "{} [{}/{}] {} ({})",
        if n.is_unread() { "●" } else { " " },
        n.category.as_str(),
        n.severity.as_str(),
        n.message,
        n.id
    )
}
