//! VisaDesk notifier: runs the live notification engine as a headless
//! background process.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use visadesk_client::HttpNotificationApi;
use visadesk_core::config::AppConfig;
use visadesk_core::error::AppError;
use visadesk_realtime::{
    FilePreferenceStore, LogAlertSink, NotificationEngine, SessionIdentity, WebSocketTransport,
};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Notifier error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("VISADESK_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    AppConfig::load(&config_path)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}

/// Start the engine and run until a shutdown signal arrives
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting VisaDesk notifier v{}", env!("CARGO_PKG_VERSION"));

    config.session.require_token()?;
    let api = Arc::new(HttpNotificationApi::new(&config.api, &config.session)?);
    let transport = Arc::new(WebSocketTransport::from_config(&config.realtime)?);
    let preferences = Arc::new(FilePreferenceStore::from_config(&config.preferences));

    tracing::info!(
        api = %config.api.base_url,
        push = %config.realtime.push_url,
        user_id = %config.session.user_id,
        "Connecting"
    );

    let engine = NotificationEngine::init(
        &config,
        SessionIdentity::from(&config.session),
        api,
        transport,
        preferences,
        Arc::new(LogAlertSink),
    )
    .await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, tearing down...");

    engine.teardown().await;
    tracing::info!(metrics = ?engine.metrics(), "VisaDesk notifier stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
