//! Row helpers over the `settings` key-value table.
//!
//! Values are stored as TEXT. Structured records such as the notification
//! settings are encoded by their owners before they reach this table.

use rusqlite::{params, Connection, OptionalExtension, Row};
use dc_core::error::{DcError, DcResult};

/// One row of the `settings` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSetting {
    pub key: String,
    pub value: String,
    /// RFC 3339 timestamp of the last write.
    pub updated_at: String,
}

impl StoredSetting {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get("key")?,
            value: row.get("value")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

fn storage_err(e: rusqlite::Error) -> DcError {
    DcError::Storage(e.to_string())
}

/// Access to the `settings` table.
pub struct Settings;

impl Settings {
    /// Value stored under `key`, `None` when absent.
    pub fn get(conn: &Connection, key: &str) -> DcResult<Option<String>> {
        conn.query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .map_err(storage_err)
    }

    /// Insert or replace the value under `key`, stamping `updated_at`.
    pub fn set(conn: &Connection, key: &str, value: &str) -> DcResult<()> {
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![key, value],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    /// Remove `key`. Returns whether a row existed.
    pub fn delete(conn: &Connection, key: &str) -> DcResult<bool> {
        let removed = conn
            .execute("DELETE FROM settings WHERE key = ?1", [key])
            .map_err(storage_err)?;
        Ok(removed > 0)
    }

    /// Every stored row, ordered by key. A row that cannot be decoded fails
    /// the whole listing.
    pub fn list(conn: &Connection) -> DcResult<Vec<StoredSetting>> {
        let mut stmt = conn
            .prepare("SELECT key, value, updated_at FROM settings ORDER BY key")
            .map_err(storage_err)?;
        let rows = stmt
            .query_map([], StoredSetting::from_row)
            .map_err(storage_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(storage_err)?;
        Ok(rows)
    }
}
