//! `watch`: run the notification engine in the foreground.

use std::sync::Arc;

use clap::Args;
use tokio::sync::broadcast::error::RecvError;

use visadesk_core::error::AppError;
use visadesk_realtime::{
    FilePreferenceStore, NotificationEngine, SessionIdentity, StoreChange, WebSocketTransport,
};

use crate::alert::TerminalAlertSink;
use crate::output;

/// Arguments for `watch`
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Print connection state transitions
    #[arg(long)]
    pub verbose: bool,
    /// Print diagnostic counters on exit
    #[arg(long)]
    pub metrics: bool,
}

/// Execute `watch`
pub async fn execute(args: &WatchArgs, config_path: &str) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let api = super::create_api(&config)?;
    let transport = Arc::new(WebSocketTransport::from_config(&config.realtime)?);

    let engine = NotificationEngine::init(
        &config,
        SessionIdentity::from(&config.session),
        api,
        transport,
        Arc::new(FilePreferenceStore::from_config(&config.preferences)),
        Arc::new(TerminalAlertSink),
    )
    .await?;

    for n in engine.notifications().iter().take(10) {
        println!("{}", output::notification_line(n));
    }
    output::print_kv("Unread", &engine.unread_count().to_string());

    let _states = args.verbose.then(|| {
        engine.on_connection_state_change(|state| match &state.last_error {
            Some(err) => output::print_warning(&format!("{} ({})", state.phase, err)),
            None => output::print_kv("Connection", state.phase.as_str()),
        })
    });

    let mut changes = engine.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            change = changes.recv() => match change {
                Ok(StoreChange::Updated(n)) => println!("~ {}", output::notification_line(&n)),
                Ok(StoreChange::Restored(n)) => println!("+ {}", output::notification_line(&n)),
                Ok(StoreChange::Removed(id)) => println!("- {}", id),
                Ok(StoreChange::Reset) => {
                    output::print_kv("Unread", &engine.unread_count().to_string());
                }
                // New notifications are announced by the alert sink.
                Ok(StoreChange::Inserted(_) | StoreChange::Loading(_)) => {}
                Err(RecvError::Lagged(skipped)) => {
                    output::print_warning(&format!("Skipped {} updates", skipped));
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    engine.teardown().await;
    if args.metrics {
        output::print_item(&engine.metrics(), output::OutputFormat::Json);
    }
    Ok(())
}
