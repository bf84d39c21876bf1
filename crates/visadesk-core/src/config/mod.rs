//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate and can be overridden with `VISADESK__SECTION__KEY`
//! environment variables. Each sub-module represents a logical section.

pub mod api;
pub mod comments;
pub mod logging;
pub mod polling;
pub mod preferences;
pub mod realtime;
pub mod review;
pub mod session;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::api::ApiConfig;
pub use self::comments::CommentsConfig;
pub use self::logging::LoggingConfig;
pub use self::polling::PollingConfig;
pub use self::preferences::PreferencesConfig;
pub use self::realtime::RealtimeConfig;
pub use self::review::ReviewConfig;
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "VISADESK";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// REST surface settings.
    pub api: ApiConfig,
    /// Push connection settings.
    pub realtime: RealtimeConfig,
    /// Fallback polling settings.
    pub polling: PollingConfig,
    /// Session identity used for the handshake and REST calls.
    pub session: SessionConfig,
    /// Client-side preference persistence.
    pub preferences: PreferencesConfig,
    /// Requested-document review thresholds.
    pub review: ReviewConfig,
    /// Comment ordering policy.
    pub comments: CommentsConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// Merges the file at `path` with an optional environment overlay named
    /// after `VISADESK_ENV` in the same directory (e.g. `config/production.toml`),
    /// then applies `VISADESK__*` environment variables. A missing base file
    /// is not an error: every field has a default.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false));

        if let Ok(env) = std::env::var(format!("{ENV_PREFIX}_ENV")) {
            let overlay = Path::new(path)
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(format!("{env}.toml"));
            builder = builder.add_source(config::File::from(overlay).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
