//! CLI command implementations.

pub mod theme;
pub mod notifications;
pub mod status;
pub mod config;
pub mod storage;

use std::sync::Arc;

use dc_core::config::AppConfig;
use dc_core::error::DcResult;
use dc_services::AppContext;
use dc_storage::{Database, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};

/// Where the providers of a CLI run persist their state.
pub enum StoreLocation {
    Database(std::path::PathBuf),
    Memory,
}

impl std::fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreLocation::Database(path) => write!(f, "{}", path.display()),
            StoreLocation::Memory => write!(f, "memory (ephemeral)"),
        }
    }
}

/// Helper to open the key-value store from config.
pub fn open_store(config: &AppConfig, ephemeral: bool) -> DcResult<(Arc<dyn KeyValueStore>, StoreLocation)> {
    if ephemeral {
        return Ok((Arc::new(MemoryKeyValueStore::new()), StoreLocation::Memory));
    }
    let db_path = config.effective_db_path()?;
    let database = Database::init(&db_path, &config.storage)?;
    Ok((
        Arc::new(SqliteKeyValueStore::new(database)),
        StoreLocation::Database(db_path),
    ))
}

/// Helper to build and mount the application context.
pub async fn open_context(config: &AppConfig, ephemeral: bool) -> DcResult<(AppContext, StoreLocation)> {
    let (store, location) = open_store(config, ephemeral)?;
    let context = AppContext::from_config(config, store)?;
    context.mount().await;
    Ok((context, location))
}

/// Render a flag as on/off for text output.
pub fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

/// Print a JSON value the way every command does.
pub fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}
