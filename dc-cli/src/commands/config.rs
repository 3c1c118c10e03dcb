//! Config commands.

use std::path::PathBuf;

use clap::Subcommand;
use console::style;

use dc_core::config::AppConfig;
use dc_core::error::{DcError, DcResult};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,
    /// Get a specific value by key path.
    Get {
        /// Key path (e.g., "notifications.reminder_hour", "storage.pool_size").
        key: String,
    },
    /// Print the configuration file path.
    Path,
    /// Write the effective configuration to the configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Resolve a dot-separated key path to a value from the config.
fn get_config_value(cfg: &AppConfig, key: &str) -> Option<String> {
    match key {
        "storage.path" => Some(cfg.storage.path.clone()),
        "storage.wal_mode" => Some(cfg.storage.wal_mode.to_string()),
        "storage.pool_size" => Some(cfg.storage.pool_size.to_string()),
        "storage.integrity_check_on_startup" => Some(cfg.storage.integrity_check_on_startup.to_string()),
        "logging.level" | "log.level" => Some(cfg.logging.level.clone()),
        "logging.directory" => Some(cfg.logging.directory.clone()),
        "logging.json_output" => Some(cfg.logging.json_output.to_string()),
        "notifications.push_enabled" => Some(cfg.notifications.push_enabled.to_string()),
        "notifications.reminder_hour" => Some(cfg.notifications.reminder_hour.to_string()),
        "notifications.reminder_minute" => Some(cfg.notifications.reminder_minute.to_string()),
        "notifications.event_bus_capacity" => Some(cfg.notifications.event_bus_capacity.to_string()),
        _ => None,
    }
}

fn print_config_text(cfg: &AppConfig) {
    println!("{}", style("Storage").bold().underlined());
    println!("  storage.path                        {}", cfg.storage.path);
    println!("  storage.wal_mode                    {}", cfg.storage.wal_mode);
    println!("  storage.pool_size                   {}", cfg.storage.pool_size);
    println!("  storage.integrity_check_on_startup  {}", cfg.storage.integrity_check_on_startup);

    println!();
    println!("{}", style("Logging").bold().underlined());
    println!("  logging.level                       {}", cfg.logging.level);
    println!("  logging.directory                   {}", cfg.logging.directory);
    println!("  logging.json_output                 {}", cfg.logging.json_output);

    println!();
    println!("{}", style("Notifications").bold().underlined());
    println!("  notifications.push_enabled          {}", cfg.notifications.push_enabled);
    println!("  notifications.reminder_hour         {}", cfg.notifications.reminder_hour);
    println!("  notifications.reminder_minute       {}", cfg.notifications.reminder_minute);
    println!("  notifications.event_bus_capacity    {}", cfg.notifications.event_bus_capacity);
}

pub fn run(config: &AppConfig, path: Option<PathBuf>, action: ConfigAction, format: OutputFormat) -> DcResult<()> {
    match action {
        ConfigAction::Show => match format {
            OutputFormat::Json => {
                let value = serde_json::to_value(config)?;
                super::print_json(&value);
            }
            OutputFormat::Text => print_config_text(config),
        },
        ConfigAction::Get { key } => match get_config_value(config, &key) {
            Some(value) => match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "key": key, "value": value }));
                }
                OutputFormat::Text => {
                    println!("{} = {}", key, value);
                }
            },
            None => {
                println!("{} Unknown config key: {}", style("ERROR").red().bold(), key);
                println!("  Use `drillcoach config show` to see available keys.");
            }
        },
        ConfigAction::Path => {
            let path = path.ok_or_else(|| DcError::Config("no configuration path available".into()))?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "path": path.display().to_string(), "exists": path.exists() }));
                }
                OutputFormat::Text => println!("{}", path.display()),
            }
        }
        ConfigAction::Init { force } => {
            let path = path.ok_or_else(|| DcError::Config("no configuration path available".into()))?;
            if path.exists() && !force {
                println!(
                    "{} {} already exists (use --force to overwrite)",
                    style("WARN").yellow().bold(),
                    path.display()
                );
                return Ok(());
            }
            config.save_to_file(&path)?;
            println!("{} Wrote {}", style("OK").green().bold(), path.display());
        }
    }
    Ok(())
}
