//! Port interfaces for the authorization flow
//!
//! These traits define the boundaries between the orchestrator and its
//! infrastructure adapters.

use async_trait::async_trait;
use authbridge_common::auth::{OAuthConfig, TokenSet};
use authbridge_domain::{ProviderClientConfig, Result, TokenRecord};

/// Durable store of encrypted refresh tokens, one per `(provider, user_id)`.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the record for `(provider, user_id)`.
    ///
    /// Returns `Ok(None)` when nothing is stored. Errors are storage failures
    /// (`BridgeError::Store`).
    async fn load(&self, provider: &str, user_id: &str) -> Result<Option<TokenRecord>>;

    /// Insert or replace the record keyed by its `(provider, user_id)`.
    async fn upsert(&self, record: TokenRecord) -> Result<()>;
}

/// Lookup of per-provider OAuth2 client registrations.
#[async_trait]
pub trait ClientConfigStore: Send + Sync {
    /// Returns `Ok(None)` for an unconfigured provider.
    async fn get(&self, provider: &str) -> Result<Option<ProviderClientConfig>>;

    /// Insert or replace the registration keyed by `config.provider`.
    async fn upsert(&self, config: ProviderClientConfig) -> Result<()>;
}

/// The provider's token endpoint.
///
/// Implementations perform network I/O and must not be called while any
/// registry lock is held.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Exchange an authorization code.
    ///
    /// # Errors
    /// `BridgeError::ExchangeFailed` when the provider rejects the code or is
    /// unreachable.
    async fn exchange_code(&self, client: &ProviderClientConfig, code: &str) -> Result<TokenSet>;

    /// Obtain a fresh access token from a refresh token.
    ///
    /// # Errors
    /// `BridgeError::RefreshFailed` when the grant is rejected or the
    /// provider is unreachable.
    async fn refresh(&self, client: &ProviderClientConfig, refresh_token: &str)
        -> Result<TokenSet>;
}

/// Build the OAuth client configuration for a stored provider registration.
#[must_use]
pub fn oauth_config_for(client: &ProviderClientConfig) -> OAuthConfig {
    OAuthConfig::new(
        client.client_id.clone(),
        client.client_secret.clone(),
        client.redirect_uri.clone(),
        client.scopes.clone(),
        client.auth_url.clone(),
        client.token_url.clone(),
    )
}
