//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use visadesk_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration (session token masked)
    Show,
    /// Validate configuration file
    Validate,
    /// Generate a default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config/generated.toml")]
        output: String,
    },
}

/// Execute config commands
pub async fn execute(args: &ConfigArgs, config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(config_path)?;
            config.session.token = mask_token(&config.session.token);
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => match super::load_config(config_path) {
            Ok(config) => {
                output::print_success(&format!("Configuration '{}' is valid", config_path));
                output::print_kv("API", &config.api.base_url);
                output::print_kv("Push", &config.realtime.push_url);
                output::print_kv(
                    "Reconnect",
                    &format!(
                        "{}ms..{}ms, {} attempts",
                        config.realtime.initial_delay_ms,
                        config.realtime.max_delay_ms,
                        config.realtime.max_reconnect_attempts
                    ),
                );
                output::print_kv("Polling", &format!("every {}s", config.polling.interval_seconds));
                if let Err(e) = config.session.require_token() {
                    output::print_warning(&e.to_string());
                }
            }
            Err(e) => {
                output::print_error(&format!("Configuration invalid: {}", e));
                return Err(e);
            }
        },
        ConfigCommand::Generate { output: out_path } => {
            let default_config = include_str!("../../../../config/default.toml");

            if let Some(parent) = std::path::Path::new(out_path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(out_path, default_config).await?;

            output::print_success(&format!("Default config written to '{}'", out_path));
        }
    }

    Ok(())
}

/// Mask a bearer token for display
fn mask_token(token: &str) -> String {
    match token.char_indices().nth(4) {
        Some((end, _)) => format!("{}****", &token[..end]),
        None if token.is_empty() => String::new(),
        None => "****".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token(""), "");
        assert_eq!(mask_token("abc"), "****");
        assert_eq!(mask_token("eyJhbGciOi"), "eyJh****");
    }
}
