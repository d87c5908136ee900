//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use authbridge_common::auth::AssertionSigner;
use authbridge_common::crypto::TokenCipher;
use authbridge_core::{
    ChallengeRegistry, EphemeralTokenCache, FlowDependencies, FlowService, FlowSettings,
    ProviderClient, TokenStore,
};
use authbridge_domain::{AppConfig, BridgeError, Result};
use authbridge_infra::{
    DbManager, HttpProviderClient, SqliteClientConfigRepository, SqliteTokenRepository,
};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// How often expired challenges and ephemeral tokens are swept.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: AppConfig,
    pub db: Arc<DbManager>,
    pub flow: Arc<FlowService>,
}

impl AppContext {
    /// Build the context with the HTTP provider client.
    ///
    /// Opens the database, runs migrations and seeds the provider
    /// registrations from `config.providers`.
    ///
    /// # Errors
    /// - `Config` for an invalid configuration or unusable secrets
    /// - `Store` when the database cannot be opened or migrated
    pub async fn new(config: AppConfig) -> Result<Self> {
        let provider = Arc::new(HttpProviderClient::new()?);
        Self::with_provider(config, provider).await
    }

    /// Build the context around an explicit provider client.
    pub async fn with_provider(
        config: AppConfig,
        provider: Arc<dyn ProviderClient>,
    ) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let clients = Arc::new(SqliteClientConfigRepository::new(Arc::clone(&db)));
        clients.seed(&config.providers).await?;
        let tokens: Arc<dyn TokenStore> = Arc::new(SqliteTokenRepository::new(Arc::clone(&db)));

        let cipher = TokenCipher::from_secret(&config.security.token_key)
            .map_err(|e| BridgeError::Config(format!("TOKEN_KEY: {e}")))?;
        let signer =
            AssertionSigner::new(&config.security.assertion_secret, config.flow.assertion_ttl_secs)
                .map_err(|e| BridgeError::Config(format!("JWT_SECRET: {e}")))?;

        let challenges =
            Arc::new(ChallengeRegistry::new(Duration::from_secs(config.flow.challenge_ttl_secs)));
        let ephemeral =
            Arc::new(EphemeralTokenCache::new(Duration::from_secs(config.flow.ephemeral_ttl_secs)));

        let flow = FlowService::new(
            FlowDependencies {
                clients,
                tokens,
                provider,
                cipher,
                signer,
                challenges,
                ephemeral,
            },
            FlowSettings::from(&config.flow),
        );

        info!(
            db_path = %db.path().display(),
            providers = config.providers.len(),
            challenge_ttl_secs = config.flow.challenge_ttl_secs,
            ephemeral_ttl_secs = config.flow.ephemeral_ttl_secs,
            "application context initialised"
        );

        Ok(Self { config, db, flow: Arc::new(flow) })
    }

    /// Spawn the periodic sweep of expired challenges and unclaimed
    /// ephemeral tokens.
    ///
    /// The task runs until the returned handle is aborted or the runtime
    /// shuts down.
    pub fn spawn_purge(&self) -> JoinHandle<()> {
        let challenges = Arc::clone(self.flow.challenges());
        let ephemeral = Arc::clone(self.flow.ephemeral());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(PURGE_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = challenges.purge_expired();
                if purged > 0 {
                    debug!(purged, remaining = challenges.len(), "expired challenges purged");
                }
                let dropped = ephemeral.purge_expired();
                if dropped > 0 {
                    debug!(dropped, remaining = ephemeral.len(), "ephemeral tokens purged");
                }
            }
        })
    }
}
