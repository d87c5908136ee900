//! Storage error types

use thiserror::Error;

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(String),

    #[error("Connection timeout after {0}s")]
    Timeout(u64),

    #[error(transparent)]
    Rusqlite(#[from] rusqlite::Error),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Whether this is the "no rows" outcome of a single-row query
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Rusqlite(rusqlite::Error::QueryReturnedNoRows))
    }
}
