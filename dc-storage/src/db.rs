//! Database initialization, connection pooling, and lifecycle management.
//!
//! Uses SQLite (WAL mode by default) with r2d2 connection pooling.
//! Runs an integrity check on startup when configured.

use std::path::Path;
use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{info, warn, error};

use dc_core::config::StorageConfig;
use dc_core::error::{DcError, DcResult};

use crate::schema;

/// Type alias for the SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Database wrapper providing initialization, pooling, and lifecycle management.
#[derive(Clone)]
pub struct Database {
    pool: Arc<DbPool>,
}

impl Database {
    /// Open (or create) the database at `db_path`.
    ///
    /// Creates parent directories, configures the pool, runs the integrity
    /// check if enabled, and creates the schema.
    pub fn init(db_path: &Path, config: &StorageConfig) -> DcResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("initializing settings database at {}", db_path.display());

        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_customizer(Box::new(ConnectionCustomizer {
                wal_mode: config.wal_mode,
            }))
            .build(manager)
            .map_err(|e| DcError::Pool(e.to_string()))?;

        let db = Self {
            pool: Arc::new(pool),
        };

        if config.integrity_check_on_startup {
            db.run_integrity_check()?;
        }

        {
            let conn = db.conn()?;
            schema::create_tables(&conn)?;
        }

        info!("settings database ready");
        Ok(db)
    }

    /// Get a connection from the pool.
    pub fn conn(&self) -> DcResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| DcError::Pool(e.to_string()))
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Run a SQLite integrity check.
    pub fn run_integrity_check(&self) -> DcResult<()> {
        let conn = self.conn()?;
        let result: String = conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))
            .map_err(|e| DcError::Storage(e.to_string()))?;

        if result != "ok" {
            error!("database integrity check failed: {result}");
            return Err(DcError::IntegrityCheck(result));
        }

        info!("database integrity check passed");
        Ok(())
    }

    /// Number of stored settings rows.
    pub fn settings_count(&self) -> DcResult<i64> {
        let conn = self.conn()?;
        conn.query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .map_err(|e| DcError::Storage(e.to_string()))
    }

    /// Reset the database by dropping and recreating all tables.
    pub fn reset(&self) -> DcResult<()> {
        warn!("resetting settings database - all stored preferences will be lost");
        let conn = self.conn()?;
        schema::drop_tables(&conn)?;
        schema::create_tables(&conn)?;
        Ok(())
    }
}

/// r2d2 connection customizer that applies PRAGMA settings.
#[derive(Debug)]
struct ConnectionCustomizer {
    wal_mode: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        if self.wal_mode {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }

        conn.execute_batch(
            "PRAGMA synchronous=NORMAL;
             PRAGMA busy_timeout=5000;",
        )?;

        Ok(())
    }
}
