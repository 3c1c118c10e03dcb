//! Database schema definitions and table creation.
//!
//! Providers persist only a handful of string values, so the schema is a
//! single key-value table plus a version row for future migrations.

use rusqlite::Connection;
use dc_core::error::{DcError, DcResult};
use tracing::info;

/// Current schema version written on creation.
pub const SCHEMA_VERSION: i32 = 1;

/// Create all database tables and indexes if they do not exist.
pub fn create_tables(conn: &Connection) -> DcResult<()> {
    conn.execute_batch(SCHEMA_SQL)
        .map_err(|e| DcError::Storage(format!("failed to create schema: {e}")))?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (id, version) VALUES (1, ?1)",
        [SCHEMA_VERSION],
    )
    .map_err(|e| DcError::Storage(format!("failed to record schema version: {e}")))?;
    info!("database schema verified");
    Ok(())
}

/// Drop all tables (used for database reset).
pub fn drop_tables(conn: &Connection) -> DcResult<()> {
    conn.execute_batch(
        "DROP TABLE IF EXISTS settings;
         DROP TABLE IF EXISTS schema_version;",
    )
    .map_err(|e| DcError::Storage(format!("failed to drop tables: {e}")))?;
    Ok(())
}

/// Read the stored schema version.
pub fn schema_version(conn: &Connection) -> DcResult<i32> {
    conn.query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| row.get(0))
        .map_err(|e| DcError::Storage(e.to_string()))
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    id                              INTEGER PRIMARY KEY CHECK (id = 1),
    version                         INTEGER NOT NULL
);

-- Provider key-value store
CREATE TABLE IF NOT EXISTS settings (
    key                             TEXT PRIMARY KEY NOT NULL,
    value                           TEXT NOT NULL,
    updated_at                      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
"#;
