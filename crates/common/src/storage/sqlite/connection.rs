//! Pooled SQLite connection wrapper

use std::ops::Deref;

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection as RusqliteConnection, Params, Row};
use tracing::instrument;

use crate::storage::error::{StorageError, StorageResult};

/// Pooled rusqlite connection
///
/// Returned to the pool when dropped. Derefs to [`rusqlite::Connection`] for
/// anything the wrapper does not cover.
pub struct SqliteConnection {
    inner: PooledConnection<SqliteConnectionManager>,
}

impl SqliteConnection {
    /// Create a new connection wrapper from a pooled connection
    pub fn new(conn: PooledConnection<SqliteConnectionManager>) -> Self {
        Self { inner: conn }
    }

    /// Execute a statement, returning the number of changed rows
    #[instrument(skip(self, params), fields(sql = %sql))]
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> StorageResult<usize> {
        self.inner.execute(sql, params).map_err(StorageError::from)
    }

    /// Execute a SQL query that returns a single row
    #[instrument(skip(self, params, f), fields(sql = %sql))]
    pub fn query_row<T, P, F>(&self, sql: &str, params: P, f: F) -> StorageResult<T>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        self.inner.query_row(sql, params, f).map_err(StorageError::from)
    }

    /// Like [`SqliteConnection::query_row`], mapping "no rows" to `None`
    pub fn query_optional<T, P, F>(&self, sql: &str, params: P, f: F) -> StorageResult<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> Result<T, rusqlite::Error>,
    {
        match self.query_row(sql, params, f) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Run a batch of semicolon-separated statements
    #[instrument(skip(self, sql))]
    pub fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        self.inner.execute_batch(sql).map_err(StorageError::from)
    }
}

impl Deref for SqliteConnection {
    type Target = RusqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
