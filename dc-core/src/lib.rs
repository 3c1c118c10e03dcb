//! drillcoach Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by the other drillcoach crates:
//! - Application configuration (storage, logging, notification schedule)
//! - Global error type covering every collaborator category
//! - Structured logging with tracing
//! - Platform detection and data directories
//! - Persisted setting keys and scheduling constants

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod constants;

// Re-export commonly used items at the crate root
pub use config::AppConfig;
pub use error::{DcError, DcResult};
pub use logging::init_logging;
pub use platform::Platform;
