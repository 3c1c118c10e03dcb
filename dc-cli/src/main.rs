//! drillcoach CLI - Command-line front end for the drillcoach state layer.
//!
//! Drives the theme store and the notification center from the terminal.
//! Useful for headless operation, scripting, and checking what a device
//! has persisted.

mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::info;

use dc_core::config::AppConfig;
use dc_core::error::DcResult;
use dc_core::logging;

/// drillcoach - training reminders, progress updates and coach tips.
#[derive(Parser)]
#[command(
    name = "drillcoach",
    version,
    about = "drillcoach state layer CLI",
    long_about = "A command-line interface for the drillcoach theme and notification providers.\n\
                   Reads and changes the persisted appearance and notification preferences."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Keep all state in memory instead of the on-disk database.
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the appearance mode.
    Theme {
        #[command(subcommand)]
        action: commands::theme::ThemeAction,
    },
    /// Show or change notification preferences.
    Notifications {
        #[command(subcommand)]
        action: commands::notifications::NotificationsAction,
    },
    /// Show provider, platform and storage status.
    Status,
    /// Inspect or create the configuration file.
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Inspect, check or reset the settings database.
    Storage {
        #[command(subcommand)]
        action: commands::storage::StorageAction,
    },
}

fn load_config(path: Option<&str>) -> DcResult<(AppConfig, Option<PathBuf>)> {
    match path {
        Some(path) => {
            let path = Path::new(path);
            Ok((AppConfig::load_from_file(path)?, Some(path.to_path_buf())))
        }
        None => match AppConfig::default_config_path() {
            Ok(default_path) => Ok((AppConfig::load_default()?, Some(default_path))),
            Err(_) => Ok((AppConfig::default(), None)),
        },
    }
}

#[tokio::main]
async fn main() -> DcResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let (config, config_path) = load_config(cli.config.as_deref())?;

    // Initialize logging
    let mut logging_config = config.logging.clone();
    if cli.verbose {
        logging_config.level = "debug".to_string();
    }
    // Without a data directory there is nowhere to rotate files into
    let _guard = match config.effective_log_dir() {
        Ok(log_dir) => Some(logging::init_logging(&logging_config, &log_dir)?),
        Err(_) => {
            logging::init_console_logging(&logging_config.level);
            None
        }
    };

    info!("drillcoach CLI v{}", dc_core::constants::APP_VERSION);

    // Dispatch to command handlers
    match cli.command {
        Commands::Theme { action } => {
            commands::theme::run(&config, cli.ephemeral, action, cli.format).await
        }
        Commands::Notifications { action } => {
            commands::notifications::run(&config, cli.ephemeral, action, cli.format).await
        }
        Commands::Status => {
            commands::status::run(&config, cli.ephemeral, cli.format).await
        }
        Commands::Config { action } => {
            commands::config::run(&config, config_path, action, cli.format)
        }
        Commands::Storage { action } => {
            commands::storage::run(&config, cli.ephemeral, action, cli.format)
        }
    }
}
