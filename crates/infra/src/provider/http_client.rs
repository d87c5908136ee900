//! reqwest-backed `ProviderClient`.
//!
//! One HTTP connection pool is shared across providers; each call wraps it in
//! an `OAuthClient` for the provider registration at hand.

use async_trait::async_trait;
use authbridge_common::auth::{OAuthClient, OAuthClientError, TokenSet};
use authbridge_core::{oauth_config_for, ProviderClient};
use authbridge_domain::{BridgeError, ProviderClientConfig, Result as DomainResult};
use reqwest::Client;
use tracing::{debug, warn};

/// Provider token endpoint client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpProviderClient {
    http: Client,
}

impl HttpProviderClient {
    /// Client with the default transport settings (30s timeout).
    pub fn new() -> DomainResult<Self> {
        let http = OAuthClient::default_http_client()
            .map_err(|e| BridgeError::Config(e.to_string()))?;
        Ok(Self { http })
    }

    /// Client sharing an existing connection pool.
    pub fn with_http_client(http: Client) -> Self {
        Self { http }
    }

    fn oauth_client(&self, client: &ProviderClientConfig) -> OAuthClient {
        OAuthClient::with_http_client(oauth_config_for(client), self.http.clone())
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn exchange_code(
        &self,
        client: &ProviderClientConfig,
        code: &str,
    ) -> DomainResult<TokenSet> {
        debug!(provider = %client.provider, "exchanging authorization code");
        self.oauth_client(client).exchange_code(code).await.map_err(|err| {
            warn!(provider = %client.provider, error = %err, "code exchange failed");
            BridgeError::ExchangeFailed(describe(&err))
        })
    }

    async fn refresh(
        &self,
        client: &ProviderClientConfig,
        refresh_token: &str,
    ) -> DomainResult<TokenSet> {
        debug!(provider = %client.provider, "refreshing access token");
        self.oauth_client(client).refresh_access_token(refresh_token).await.map_err(|err| {
            warn!(provider = %client.provider, error = %err, "token refresh failed");
            BridgeError::RefreshFailed(describe(&err))
        })
    }
}

/// Short description of a token-endpoint failure, safe to return to callers.
fn describe(err: &OAuthClientError) -> String {
    match err {
        OAuthClientError::OAuthError(oauth) => oauth.to_string(),
        OAuthClientError::HttpStatus { status, .. } => format!("token endpoint returned {status}"),
        OAuthClientError::RequestFailed(e) if e.is_timeout() => "token endpoint timed out".into(),
        OAuthClientError::RequestFailed(_) => "token endpoint unreachable".into(),
        other => other.to_string(),
    }
}
