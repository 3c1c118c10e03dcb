//! The async key-value boundary used by providers.
//!
//! Providers only ever need `get` and `set` of string values. Reads that fail
//! are the caller's problem to absorb; writes report failure so the caller
//! can log it.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use dc_core::error::{DcError, DcResult};

use crate::db::Database;
use crate::settings::Settings;

/// Persistent string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent.
    async fn get(&self, key: &str) -> DcResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> DcResult<()>;
}

/// `KeyValueStore` backed by the SQLite `settings` table.
///
/// rusqlite is blocking, so each call runs on tokio's blocking pool.
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    database: Database,
}

impl SqliteKeyValueStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> DcResult<Option<String>> {
        let database = self.database.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = database.conn()?;
            Settings::get(&conn, &key)
        })
        .await
        .map_err(|e| DcError::Internal(format!("settings read task failed: {e}")))?
    }

    async fn set(&self, key: &str, value: &str) -> DcResult<()> {
        let database = self.database.clone();
        let key = key.to_string();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = database.conn()?;
            Settings::set(&conn, &key, &value)?;
            debug!("persisted setting {key}");
            Ok(())
        })
        .await
        .map_err(|e| DcError::Internal(format!("settings write task failed: {e}")))?
    }
}

/// In-memory `KeyValueStore`, for ephemeral runs and tests.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.values.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.lock().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> DcResult<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> DcResult<()> {
        self.values
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
