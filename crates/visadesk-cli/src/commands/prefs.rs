//! Delivery preference commands.

use clap::{Args, Subcommand};

use visadesk_core::error::AppError;
use visadesk_entity::PreferencesPatch;
use visadesk_realtime::{FilePreferenceStore, PreferenceStore};

use crate::output::{self, OutputFormat};

/// Arguments for prefs commands
#[derive(Debug, Args)]
pub struct PrefsArgs {
    /// Prefs subcommand
    #[command(subcommand)]
    pub command: PrefsCommand,
}

/// Prefs subcommands
#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// Show the saved preferences
    Show,
    /// Change preferences
    Set {
        /// Play a sound for new notifications
        #[arg(long)]
        sound: Option<bool>,
        /// Show a desktop alert for new notifications
        #[arg(long)]
        desktop: Option<bool>,
    },
}

/// Execute prefs commands
pub async fn execute(args: &PrefsArgs, config_path: &str, format: OutputFormat) -> Result<(), AppError> {
    let config = super::load_config(config_path)?;
    let store = FilePreferenceStore::from_config(&config.preferences);

    match &args.command {
        PrefsCommand::Show => {
            let prefs = store.load().await?;
            match format {
                OutputFormat::Table => {
                    output::print_kv("Sound", &prefs.sound_enabled.to_string());
                    output::print_kv("Desktop", &prefs.desktop_enabled.to_string());
                    output::print_kv("File", &store.path().display().to_string());
                }
                OutputFormat::Json => output::print_item(&prefs, format),
            }
        }
        PrefsCommand::Set { sound, desktop } => {
            let patch = PreferencesPatch {
                sound_enabled: *sound,
                desktop_enabled: *desktop,
            };
            if patch.is_empty() {
                output::print_warning("Nothing to change (use --sound and/or --desktop)");
                return Ok(());
            }
            let prefs = store.load().await?.merged(&patch);
            store.save(&prefs).await?;
            output::print_success("Preferences saved");
            output::print_item(&prefs, format);
        }
    }

    Ok(())
}
