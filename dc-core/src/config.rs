//! Application configuration management.
//!
//! Handles loading, saving, and validating the configuration that wires the
//! providers: where the settings database lives, how logging is set up, and
//! when the daily reminder fires. Configuration is persisted as TOML on disk.

use std::path::{Path, PathBuf};
use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_EVENT_BUS_CAPACITY, DEFAULT_REMINDER_HOUR, DEFAULT_REMINDER_MINUTE};
use crate::error::{DcError, DcResult};
use crate::platform::Platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Settings database.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Push registration and reminder schedule.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Settings database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file. If empty, uses default location.
    #[serde(default)]
    pub path: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Run integrity check on startup.
    #[serde(default = "default_true")]
    pub integrity_check_on_startup: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output in the log file.
    #[serde(default)]
    pub json_output: bool,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether this installation may register for push at all.
    /// `false` behaves exactly like a denied permission.
    #[serde(default = "default_true")]
    pub push_enabled: bool,

    /// Local hour of the daily drill reminder.
    #[serde(default = "default_reminder_hour")]
    pub reminder_hour: u32,

    /// Minute of the daily drill reminder.
    #[serde(default = "default_reminder_minute")]
    pub reminder_minute: u32,

    /// Capacity of the application event bus.
    #[serde(default = "default_event_bus_capacity")]
    pub event_bus_capacity: usize,
}

// Default value functions for serde

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_reminder_hour() -> u32 {
    DEFAULT_REMINDER_HOUR
}

fn default_reminder_minute() -> u32 {
    DEFAULT_REMINDER_MINUTE
}

fn default_event_bus_capacity() -> usize {
    DEFAULT_EVENT_BUS_CAPACITY
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            wal_mode: true,
            pool_size: default_pool_size(),
            integrity_check_on_startup: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            push_enabled: true,
            reminder_hour: default_reminder_hour(),
            reminder_minute: default_reminder_minute(),
            event_bus_capacity: default_event_bus_capacity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default config file path.
    pub fn load_default() -> DcResult<Self> {
        let path = Self::default_config_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> DcResult<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> DcResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config directory {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| DcError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> DcResult<PathBuf> {
        Ok(Platform::config_dir()?.join("config.toml"))
    }

    /// Get the effective database path, using the configured path or the default.
    pub fn effective_db_path(&self) -> DcResult<PathBuf> {
        if self.storage.path.is_empty() {
            Ok(Platform::data_dir()?.join("drillcoach.db"))
        } else {
            Ok(PathBuf::from(&self.storage.path))
        }
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> DcResult<PathBuf> {
        if self.logging.directory.is_empty() {
            Ok(Platform::data_dir()?.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Reject values that would make the providers misbehave.
    pub fn validate(&self) -> DcResult<()> {
        if self.notifications.reminder_hour >= 24 {
            return Err(DcError::Config(format!(
                "notifications.reminder_hour must be below 24, got {}",
                self.notifications.reminder_hour
            )));
        }
        if self.notifications.reminder_minute >= 60 {
            return Err(DcError::Config(format!(
                "notifications.reminder_minute must be below 60, got {}",
                self.notifications.reminder_minute
            )));
        }
        if self.notifications.event_bus_capacity == 0 {
            return Err(DcError::Config("notifications.event_bus_capacity must be positive".into()));
        }
        if self.storage.pool_size == 0 {
            return Err(DcError::Config("storage.pool_size must be positive".into()));
        }
        Ok(())
    }
}
