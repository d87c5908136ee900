//! Database connection manager backed by the shared SQLite pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use authbridge_common::storage::{SqliteConnection, SqlitePool, SqlitePoolConfig, StorageError};
use authbridge_domain::{DatabaseConfig, Result};
use rusqlite::params;
use tracing::info;

use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an [`SqlitePool`].
pub struct DbManager {
    pool: Arc<SqlitePool>,
    path: PathBuf,
}

impl DbManager {
    /// Open (or create) the database at `db_path` with `pool_size`
    /// connections.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let pool = SqlitePool::new(&path, SqlitePoolConfig::with_max_size(pool_size))
            .map_err(map_storage_error)?;

        info!(
            db_path = %path.display(),
            max_connections = pool.max_size(),
            "sqlite pool initialised"
        );

        Ok(Self { pool: Arc::new(pool), path })
    }

    /// Open the database described by `config`.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::new(&config.path, config.pool_size)
    }

    /// Borrow the underlying pool.
    pub fn pool(&self) -> &Arc<SqlitePool> {
        &self.pool
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<SqliteConnection> {
        self.pool.get_connection().map_err(map_storage_error)
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        create_schema(&conn)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire a connection and run `SELECT 1`.
    pub fn health_check(&self) -> Result<()> {
        self.pool.health_check().map_err(map_storage_error)
    }
}

fn create_schema(conn: &SqliteConnection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(map_storage_error)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, CAST(strftime('%s','now') AS INTEGER))",
        params![SCHEMA_VERSION],
    )
    .map_err(map_storage_error)?;
    Ok(())
}

pub(crate) fn map_storage_error(err: StorageError) -> authbridge_domain::BridgeError {
    InfraError::from(err).into()
}
