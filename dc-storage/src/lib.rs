//! drillcoach Storage - the persistence boundary behind every provider.
//!
//! This crate owns durable state: a pooled SQLite database holding a single
//! `settings` key-value table, synchronous row helpers over that table, and
//! the async `KeyValueStore` trait the providers are written against, with a
//! SQLite-backed and an in-memory implementation.

pub mod db;
pub mod schema;
pub mod settings;
pub mod kv;

// Re-export key types
pub use db::{Database, DbPool};
pub use settings::{Settings, StoredSetting};
pub use kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
