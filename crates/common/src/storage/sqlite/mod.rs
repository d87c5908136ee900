//! SQLite backend implementation
//!
//! Provides an r2d2-based connection pool for plain SQLite databases.

pub mod config;
pub mod connection;
pub mod pool;
pub mod pragmas;

pub use config::SqlitePoolConfig;
pub use connection::SqliteConnection;
pub use pool::SqlitePool;
pub use pragmas::apply_connection_pragmas;
