//! Storage management commands.

use clap::Subcommand;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use console::style;
use dialoguer::Confirm;

use dc_core::config::AppConfig;
use dc_core::error::{DcError, DcResult};
use dc_storage::{Database, Settings};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum StorageAction {
    /// Show the stored preferences and database details.
    Info,
    /// Run an integrity check.
    Check,
    /// Remove one stored preference so its provider falls back to the default.
    Forget {
        /// Stored key (e.g., "themeMode", "notificationSettings").
        key: String,
    },
    /// Reset the database (WARNING: forgets every stored preference).
    Reset {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the database file path.
    Path,
}

pub fn run(config: &AppConfig, ephemeral: bool, action: StorageAction, format: OutputFormat) -> DcResult<()> {
    if ephemeral {
        println!(
            "{} Storage commands do not apply to an ephemeral run.",
            style("WARN").yellow().bold()
        );
        return Ok(());
    }

    let db_path = config.effective_db_path()?;

    match action {
        StorageAction::Info => {
            let db = Database::init(&db_path, &config.storage)?;
            let count = db.settings_count()?;
            let conn = db.conn()?;
            let journal_mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .map_err(|e| DcError::Storage(e.to_string()))?;
            let rows = Settings::list(&conn)?;
            let file_size = std::fs::metadata(&db_path).map(|m| m.len()).ok();

            match format {
                OutputFormat::Json => {
                    let settings: Vec<serde_json::Value> = rows
                        .into_iter()
                        .map(|row| {
                            serde_json::json!({
                                "key": row.key,
                                "value": row.value,
                                "updatedAt": row.updated_at,
                            })
                        })
                        .collect();
                    super::print_json(&serde_json::json!({
                        "path": db_path.display().to_string(),
                        "journalMode": journal_mode,
                        "fileSize": file_size,
                        "settingsCount": count,
                        "settings": settings,
                    }));
                }
                OutputFormat::Text => {
                    println!("{}", style("Storage").bold().underlined());
                    println!("  Path:          {}", db_path.display());
                    println!("  Journal mode:  {}", journal_mode);
                    if let Some(size) = file_size {
                        println!("  Size:          {} bytes", size);
                    }
                    println!("  Settings:      {}", count);

                    if !rows.is_empty() {
                        println!();
                        let mut table = Table::new();
                        table
                            .load_preset(UTF8_FULL)
                            .apply_modifier(UTF8_ROUND_CORNERS)
                            .set_content_arrangement(ContentArrangement::Dynamic);
                        table.set_header(vec!["Key", "Value", "Updated"]);
                        for row in rows {
                            table.add_row(vec![row.key, row.value, row.updated_at]);
                        }
                        println!("{table}");
                    }
                }
            }
        }
        StorageAction::Check => {
            let db = Database::init(&db_path, &config.storage)?;
            match db.run_integrity_check() {
                Ok(()) => println!("  {} Integrity check passed.", style("OK").green().bold()),
                Err(e) => println!("  {} Integrity check failed: {}", style("FAIL").red().bold(), e),
            }
        }
        StorageAction::Forget { key } => {
            let db = Database::init(&db_path, &config.storage)?;
            let conn = db.conn()?;
            let removed = Settings::delete(&conn, &key)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "key": key, "removed": removed }));
                }
                OutputFormat::Text if removed => {
                    println!("{} Forgot {}", style("OK").green().bold(), key);
                }
                OutputFormat::Text => {
                    println!("{} Nothing stored under {}", style("WARN").yellow().bold(), key);
                }
            }
        }
        StorageAction::Reset { yes } => {
            println!(
                "  {} This forgets the stored theme and notification preferences.",
                style("WARNING").red().bold()
            );
            println!("  Database: {}", db_path.display());

            let confirmed = yes
                || Confirm::new()
                    .with_prompt("  Are you sure you want to reset the database?")
                    .default(false)
                    .interact()
                    .unwrap_or(false);

            if !confirmed {
                println!("  Reset cancelled.");
                return Ok(());
            }

            let db = Database::init(&db_path, &config.storage)?;
            db.reset()?;
            println!("  {} Database reset complete.", style("OK").green().bold());
        }
        StorageAction::Path => match format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({ "path": db_path.display().to_string(), "exists": db_path.exists() })
                );
            }
            OutputFormat::Text => println!("{}", db_path.display()),
        },
    }

    Ok(())
}
