//! Platform detection and OS-specific utilities.

use std::path::PathBuf;
use crate::error::{DcError, DcResult};

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    /// Any target without a native notification service (wasm, bare metal, ...).
    Other,
}

impl Platform {
    /// Detect the current platform at compile time.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    /// Whether this platform can deliver native notifications.
    pub fn supports_notifications(&self) -> bool {
        !matches!(self, Platform::Other)
    }

    /// Get the platform-specific application data directory.
    ///
    /// - Windows: `%APPDATA%/drillcoach`
    /// - macOS: `~/Library/Application Support/drillcoach`
    /// - Linux: `~/.local/share/drillcoach`
    pub fn data_dir() -> DcResult<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| DcError::Config("could not determine data directory".into()))?;
        Ok(base.join(crate::constants::APP_NAME))
    }

    /// Get the platform-specific configuration directory.
    pub fn config_dir() -> DcResult<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| DcError::Config("could not determine config directory".into()))?;
        Ok(base.join(crate::constants::APP_NAME))
    }

    /// Get a human-readable platform name.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::MacOs => "macOS",
            Platform::Linux => "Linux",
            Platform::Other => "other",
        }
    }

    /// Get the system hostname, used to label the installation token.
    pub fn hostname() -> String {
        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "drillcoach-device".to_string())
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
