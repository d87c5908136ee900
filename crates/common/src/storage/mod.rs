//! Pooled SQLite storage
//!
//! Generic r2d2/rusqlite plumbing. Schema ownership stays with the
//! application layer; nothing here creates tables.

pub mod error;
pub mod sqlite;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use sqlite::{apply_connection_pragmas, SqliteConnection, SqlitePool, SqlitePoolConfig};
