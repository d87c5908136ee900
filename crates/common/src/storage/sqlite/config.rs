//! SQLite connection pool configuration

use std::time::Duration;

/// SQLite pool configuration
#[derive(Debug, Clone)]
pub struct SqlitePoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,

    /// How long `get` waits for a free connection
    pub connection_timeout: Duration,

    /// Busy timeout for SQLite lock contention
    pub busy_timeout: Duration,

    /// Enable WAL journal mode
    pub enable_wal: bool,
}

impl SqlitePoolConfig {
    /// Default settings with the given pool size (minimum 1)
    #[must_use]
    pub fn with_max_size(max_size: u32) -> Self {
        Self { max_size: max_size.max(1), ..Self::default() }
    }
}

impl Default for SqlitePoolConfig {
    fn default() -> Self {
        Self {
            max_size: 4,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5000),
            enable_wal: true,
        }
    }
}
