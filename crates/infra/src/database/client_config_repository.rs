//! SQLite-backed provider client registrations.
//!
//! Implements the `ClientConfigStore` port over the `oauth_clients` table.
//! Scopes are stored comma-separated.

use std::sync::Arc;

use async_trait::async_trait;
use authbridge_common::storage::{SqliteConnection, StorageError};
use authbridge_core::ClientConfigStore;
use authbridge_domain::{ProviderClientConfig, Result as DomainResult};
use rusqlite::params;
use tokio::task;
use tracing::info;

use super::manager::{map_storage_error, DbManager};
use crate::errors::map_join_error;

/// SQLite-backed provider client repository.
pub struct SqliteClientConfigRepository {
    db: Arc<DbManager>,
}

impl SqliteClientConfigRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Upsert every registration from configuration.
    ///
    /// Returns the number of providers written.
    pub async fn seed(&self, clients: &[ProviderClientConfig]) -> DomainResult<usize> {
        for client in clients {
            ClientConfigStore::upsert(self, client.clone()).await?;
        }
        if !clients.is_empty() {
            info!(count = clients.len(), "provider client registrations seeded");
        }
        Ok(clients.len())
    }
}

#[async_trait]
impl ClientConfigStore for SqliteClientConfigRepository {
    async fn get(&self, provider: &str) -> DomainResult<Option<ProviderClientConfig>> {
        let db = Arc::clone(&self.db);
        let provider = provider.to_string();

        task::spawn_blocking(move || -> DomainResult<Option<ProviderClientConfig>> {
            let conn = db.get_connection()?;
            query_client(&conn, &provider).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(&self, config: ProviderClientConfig) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            upsert_client(&conn, &config).map_err(map_storage_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_client(
    conn: &SqliteConnection,
    provider: &str,
) -> Result<Option<ProviderClientConfig>, StorageError> {
    conn.query_optional(
        "SELECT provider, client_id, client_secret, redirect_uri, scopes, auth_url, token_url
         FROM oauth_clients
         WHERE provider = ?1",
        params![provider],
        |row| {
            Ok(ProviderClientConfig {
                provider: row.get(0)?,
                client_id: row.get(1)?,
                client_secret: row.get(2)?,
                redirect_uri: row.get(3)?,
                scopes: ProviderClientConfig::parse_scopes(&row.get::<_, String>(4)?),
                auth_url: row.get(5)?,
                token_url: row.get(6)?,
            })
        },
    )
}

fn upsert_client(
    conn: &SqliteConnection,
    config: &ProviderClientConfig,
) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO oauth_clients
            (provider, client_id, client_secret, redirect_uri, scopes, auth_url, token_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(provider) DO UPDATE SET
            client_id = excluded.client_id,
            client_secret = excluded.client_secret,
            redirect_uri = excluded.redirect_uri,
            scopes = excluded.scopes,
            auth_url = excluded.auth_url,
            token_url = excluded.token_url",
        params![
            config.provider,
            config.client_id,
            config.client_secret,
            config.redirect_uri,
            config.scopes_csv(),
            config.auth_url,
            config.token_url,
        ],
    )?;
    Ok(())
}
