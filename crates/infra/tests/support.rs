use std::sync::Arc;

use authbridge_domain::ProviderClientConfig;
use authbridge_infra::database::DbManager;
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a migrated database in a fresh temp directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = open(&temp_dir);
        Self { manager, temp_dir }
    }

    /// Drop the current pool and open the same file again.
    pub fn reopen(self) -> Self {
        let Self { manager, temp_dir } = self;
        drop(manager);
        let manager = open(&temp_dir);
        Self { manager, temp_dir }
    }

    /// Count rows in `table`.
    pub fn count_rows(&self, table: &str) -> i64 {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count query should succeed")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

fn open(temp_dir: &TempDir) -> Arc<DbManager> {
    let manager =
        DbManager::new(temp_dir.path().join("test.db"), 4).expect("db manager should be created");
    manager.run_migrations().expect("migrations should run");
    Arc::new(manager)
}

/// Registration pointing both endpoints at `base_url`.
pub fn provider_at(base_url: &str) -> ProviderClientConfig {
    ProviderClientConfig {
        provider: "google".into(),
        client_id: "test-client".into(),
        client_secret: "test-secret".into(),
        redirect_uri: "http://localhost:9090/callback".into(),
        scopes: vec!["openid".into(), "email".into()],
        auth_url: format!("{base_url}/auth"),
        token_url: format!("{base_url}/token"),
    }
}
