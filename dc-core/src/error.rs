//! Global error types for drillcoach.
//!
//! Every collaborator the providers talk to (storage, push registration,
//! reminder scheduling, event sources) reports failures through `DcError`.
//! Providers absorb these at the call site; only the CLI surfaces them.

use thiserror::Error;

/// Convenience type alias for Results using DcError.
pub type DcResult<T> = Result<T, DcError>;

/// Unified error type covering all error categories in drillcoach.
#[derive(Error, Debug)]
pub enum DcError {
    // -- Configuration errors --
    /// Failed to load, parse or validate application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    // -- Storage errors --
    /// Key-value store read or write failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Database connection pool error.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Database integrity check failed.
    #[error("database integrity check failed: {0}")]
    IntegrityCheck(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // -- Platform collaborator errors --
    /// Push registration failed.
    #[error("push registration error: {0}")]
    Push(String),

    /// Reminder scheduling failed.
    #[error("scheduler error: {0}")]
    Scheduler(String),

    /// Subscribing to a notification event stream failed.
    #[error("event source error: {0}")]
    EventSource(String),

    /// Desktop notification could not be shown.
    #[error("notification error: {0}")]
    Notification(String),

    // -- Generic --
    /// A caller supplied a value outside the accepted range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for DcError {
    fn from(e: serde_json::Error) -> Self {
        DcError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for DcError {
    fn from(e: toml::de::Error) -> Self {
        DcError::Config(e.to_string())
    }
}
