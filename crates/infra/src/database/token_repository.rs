//! SQLite-backed refresh-token repository.
//!
//! Implements the `TokenStore` port. Both key columns are `COLLATE NOCASE`,
//! so lookups and the uniqueness constraint ignore case alike. Writes are a
//! single `INSERT ... ON CONFLICT DO UPDATE`, so concurrent writers for the
//! same pair (in any casing) leave exactly one row. All database operations run in
//! `spawn_blocking` to avoid blocking the async runtime.

use std::sync::Arc;

use async_trait::async_trait;
use authbridge_common::storage::{SqliteConnection, StorageError};
use authbridge_core::TokenStore;
use authbridge_domain::{BridgeError, Result as DomainResult, TokenRecord};
use chrono::{DateTime, Utc};
use rusqlite::params;
use tokio::task;

use super::manager::{map_storage_error, DbManager};
use crate::errors::map_join_error;

/// SQLite-backed token repository.
pub struct SqliteTokenRepository {
    db: Arc<DbManager>,
}

impl SqliteTokenRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for SqliteTokenRepository {
    async fn load(&self, provider: &str, user_id: &str) -> DomainResult<Option<TokenRecord>> {
        let db = Arc::clone(&self.db);
        let provider = provider.to_string();
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<TokenRecord>> {
            let conn = db.get_connection()?;
            query_token(&conn, &provider, &user_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(&self, record: TokenRecord) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            upsert_token(&conn, &record).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_token(
    conn: &SqliteConnection,
    provider: &str,
    user_id: &str,
) -> DomainResult<Option<TokenRecord>> {
    let row = conn
        .query_optional(
            "SELECT provider, user_id, refresh_token, updated_at
             FROM tokens
             WHERE provider = ?1 AND user_id = ?2",
            params![provider, user_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .map_err(map_storage_error)?;

    row.map(|(provider, user_id, encrypted_refresh_token, updated_at)| {
        Ok(TokenRecord {
            provider,
            user_id,
            encrypted_refresh_token,
            updated_at: parse_timestamp(&updated_at)?,
        })
    })
    .transpose()
}

/// Upsert pattern (SQLite 3.24.0+)
fn upsert_token(conn: &SqliteConnection, record: &TokenRecord) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO tokens (provider, user_id, refresh_token, updated_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(provider, user_id) DO UPDATE SET
            refresh_token = excluded.refresh_token,
            updated_at = excluded.updated_at",
        params![
            record.provider,
            record.user_id,
            record.encrypted_refresh_token,
            record.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn parse_timestamp(raw: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| BridgeError::Store(format!("invalid updated_at '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn setup() -> (SqliteTokenRepository, Arc<DbManager>, TempDir) {
        let dir = TempDir::new().expect("temp dir created");
        let manager = Arc::new(DbManager::new(dir.path().join("tokens.db"), 2).expect("manager"));
        manager.run_migrations().expect("migrations run");
        (SqliteTokenRepository::new(Arc::clone(&manager)), manager, dir)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_record_is_none() {
        let (repo, _mgr, _dir) = setup().await;
        assert!(repo.load("google", "alice").await.expect("query succeeded").is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_replaces_existing_record() {
        let (repo, mgr, _dir) = setup().await;

        repo.upsert(TokenRecord::new("google", "alice", "sealed-1")).await.expect("insert");
        repo.upsert(TokenRecord::new("google", "alice", "sealed-2")).await.expect("update");

        let record = repo.load("google", "alice").await.expect("query").expect("present");
        assert_eq!(record.encrypted_refresh_token, "sealed-2");

        let conn = mgr.get_connection().expect("connection");
        let rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM tokens", [], |row| row.get(0)).expect("count");
        assert_eq!(rows, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lookup_is_case_insensitive() {
        let (repo, _mgr, _dir) = setup().await;
        repo.upsert(TokenRecord::new("Google", "Alice", "sealed")).await.expect("insert");

        let record = repo.load("GOOGLE", "alice").await.expect("query").expect("present");
        assert_eq!(record.provider, "Google");
        assert_eq!(record.user_id, "Alice");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn differently_cased_user_shares_one_row() {
        let (repo, mgr, _dir) = setup().await;

        repo.upsert(TokenRecord::new("google", "Alice", "sealed-1")).await.expect("insert");
        repo.upsert(TokenRecord::new("Google", "alice", "sealed-2")).await.expect("update");

        let conn = mgr.get_connection().expect("connection");
        let rows: i64 =
            conn.query_row("SELECT COUNT(*) FROM tokens", [], |row| row.get(0)).expect("count");
        assert_eq!(rows, 1);

        for user in ["Alice", "alice", "ALICE"] {
            let record = repo.load("google", user).await.expect("query").expect("present");
            assert_eq!(record.encrypted_refresh_token, "sealed-2");
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn updated_at_round_trips() {
        let (repo, _mgr, _dir) = setup().await;
        let record = TokenRecord::new("google", "alice", "sealed");
        repo.upsert(record.clone()).await.expect("insert");

        let loaded = repo.load("google", "alice").await.expect("query").expect("present");
        assert_eq!(loaded.updated_at, record.updated_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn corrupt_timestamp_is_a_store_error() {
        let (repo, mgr, _dir) = setup().await;
        mgr.get_connection()
            .expect("connection")
            .execute(
                "INSERT INTO tokens (provider, user_id, refresh_token, updated_at)
                 VALUES ('google', 'alice', 'sealed', 'yesterday')",
                [],
            )
            .expect("raw insert");

        let err = repo.load("google", "alice").await.expect_err("bad timestamp");
        assert!(matches!(err, BridgeError::Store(_)));
    }
}
