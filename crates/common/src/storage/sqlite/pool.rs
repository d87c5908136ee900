//! SQLite connection pool
//!
//! r2d2-based pooling with per-connection pragmas applied on open.

use std::path::Path;
use std::time::Instant;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, instrument, warn};

use super::config::SqlitePoolConfig;
use super::connection::SqliteConnection;
use super::pragmas::apply_connection_pragmas;
use crate::storage::error::{StorageError, StorageResult};

/// SQLite connection pool
#[derive(Debug)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: SqlitePoolConfig,
}

impl SqlitePool {
    /// Create a new pool for the database file at `path`
    ///
    /// The file is created if missing. A connection is opened eagerly so a
    /// bad path fails here rather than on the first request.
    ///
    /// # Errors
    /// Returns an error if the database file can't be opened or pool creation
    /// fails.
    #[instrument(fields(db_path = ?path, pool_size = config.max_size))]
    pub fn new(path: &Path, config: SqlitePoolConfig) -> StorageResult<Self> {
        info!("Creating SQLite connection pool");

        let pragma_config = config.clone();
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            apply_connection_pragmas(conn, &pragma_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        });

        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!("Failed to create connection pool: {}", e);
                StorageError::Connection(format!("Failed to create pool: {e}"))
            })?;

        info!("SQLite pool created successfully with {} connections", config.max_size);

        Ok(Self { pool, config })
    }

    /// Get a connection from the pool
    #[instrument(skip(self), fields(pool_size = self.config.max_size))]
    pub fn get_connection(&self) -> StorageResult<SqliteConnection> {
        let start = Instant::now();

        match self.pool.get() {
            Ok(conn) => {
                debug!("Connection acquired in {}ms", start.elapsed().as_millis());
                Ok(SqliteConnection::new(conn))
            }
            Err(e) => {
                let err_str = e.to_string().to_lowercase();
                if err_str.contains("timed out") || err_str.contains("timeout") {
                    warn!("Connection timeout after {:?}", self.config.connection_timeout);
                    Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
                } else {
                    warn!("Connection error: {}", e);
                    Err(StorageError::Connection(format!("Failed to get connection: {e}")))
                }
            }
        }
    }

    /// Verify a connection can be acquired and answers `SELECT 1`
    pub fn health_check(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Configured maximum pool size
    #[must_use]
    pub fn max_size(&self) -> u32 {
        self.config.max_size
    }
}
