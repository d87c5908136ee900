//! Flow orchestrator - core business logic
//!
//! Drives the three-step handshake:
//!
//! 1. `start_flow`: register an optional challenge and build the provider
//!    authorization URL with the flow metadata encoded in `state`.
//! 2. `complete_flow`: exchange the code and keep the tokens according to the
//!    cache mode, then pick where to send the user agent.
//! 3. `get_token`: verify the caller (assertion or challenge) and hand out an
//!    access token.
//!
//! No lock is held across a provider call; the registry and cache guard only
//! their own map accesses.

use std::sync::Arc;

use authbridge_common::auth::{AssertionSigner, TokenSet};
use authbridge_common::crypto::TokenCipher;
use authbridge_domain::{
    BridgeError, CacheMode, FlowConfig, FlowState, ProviderClientConfig, Result, TokenRecord,
};
use tracing::{debug, info, warn};

use super::ports::{oauth_config_for, ClientConfigStore, ProviderClient, TokenStore};
use super::types::{
    AuthMethod, Authentication, CallbackOutcome, Credentials, GetTokenRequest, RedirectTarget,
    StartFlowRequest, TokenPayload,
};
use crate::challenge::ChallengeRegistry;
use crate::ephemeral::EphemeralTokenCache;

/// Collaborators injected into [`FlowService`].
pub struct FlowDependencies {
    pub clients: Arc<dyn ClientConfigStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub provider: Arc<dyn ProviderClient>,
    pub cipher: TokenCipher,
    pub signer: AssertionSigner,
    pub challenges: Arc<ChallengeRegistry>,
    pub ephemeral: Arc<EphemeralTokenCache>,
}

/// Deep-link settings for mobile callbacks.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub default_return_scheme: String,
    pub mobile_callback_path: String,
}

impl From<&FlowConfig> for FlowSettings {
    fn from(config: &FlowConfig) -> Self {
        Self {
            default_return_scheme: config.default_return_scheme.clone(),
            mobile_callback_path: config.mobile_callback_path.clone(),
        }
    }
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self::from(&FlowConfig::default())
    }
}

/// Authorization-code flow orchestrator
pub struct FlowService {
    clients: Arc<dyn ClientConfigStore>,
    tokens: Arc<dyn TokenStore>,
    provider: Arc<dyn ProviderClient>,
    cipher: TokenCipher,
    signer: AssertionSigner,
    challenges: Arc<ChallengeRegistry>,
    ephemeral: Arc<EphemeralTokenCache>,
    settings: FlowSettings,
}

impl FlowService {
    pub fn new(deps: FlowDependencies, settings: FlowSettings) -> Self {
        Self {
            clients: deps.clients,
            tokens: deps.tokens,
            provider: deps.provider,
            cipher: deps.cipher,
            signer: deps.signer,
            challenges: deps.challenges,
            ephemeral: deps.ephemeral,
            settings,
        }
    }

    /// Shared challenge registry (also swept by the background purge task).
    pub fn challenges(&self) -> &Arc<ChallengeRegistry> {
        &self.challenges
    }

    pub fn ephemeral(&self) -> &Arc<EphemeralTokenCache> {
        &self.ephemeral
    }

    /// Start a flow and return the provider authorization URL.
    ///
    /// The challenge, when given, is registered before the URL is returned so
    /// the callback can never race ahead of it.
    ///
    /// # Errors
    /// - `BadRequest` for a missing provider/user or a field that cannot be
    ///   carried in `state`
    /// - `UnknownProvider` when no client registration exists
    pub async fn start_flow(&self, request: StartFlowRequest) -> Result<String> {
        let state = FlowState::new(
            request.provider,
            request.user_id,
            request.platform,
            request.return_scheme.unwrap_or_default(),
            request.cache_mode,
        )?;

        let client = self.client_config(state.provider()).await?;

        if let Some(challenge) = request.challenge.as_deref().filter(|c| !c.is_empty()) {
            self.challenges.register(state.user_id(), challenge, state.platform());
        }

        let url =
            oauth_config_for(&client).authorization_url(&state.encode(), Some(state.user_id()));

        info!(
            provider = state.provider(),
            platform = %state.platform(),
            cache_mode = %state.cache_mode(),
            "authorization flow started"
        );
        Ok(url)
    }

    /// Handle the provider callback.
    ///
    /// # Errors
    /// - `InvalidState` when `state` cannot be decoded (no exchange attempted)
    /// - `BadRequest` for an empty code
    /// - `UnknownProvider` when the provider registration disappeared
    /// - `ExchangeFailed` when the provider rejects the code, or when a
    ///   persistent flow receives no refresh token (nothing is stored)
    /// - `Store` when the token record cannot be written
    pub async fn complete_flow(&self, state: &str, code: &str) -> Result<CallbackOutcome> {
        let state = FlowState::decode(state)?;
        if code.is_empty() {
            return Err(BridgeError::BadRequest("code is required".into()));
        }

        let client = self.client_config(state.provider()).await?;
        let tokens = self.provider.exchange_code(&client, code).await?;

        match state.cache_mode() {
            CacheMode::Persistent => self.store_refresh_token(&state, &tokens).await?,
            CacheMode::Ephemeral => {
                if self.ephemeral.put(state.user_id(), tokens) {
                    debug!(provider = state.provider(), "replaced unconsumed ephemeral tokens");
                }
            }
        }

        info!(
            provider = state.provider(),
            platform = %state.platform(),
            cache_mode = %state.cache_mode(),
            "authorization flow completed"
        );

        let target = if state.platform().is_mobile() {
            RedirectTarget::DeepLink(self.deep_link(&state)?)
        } else {
            RedirectTarget::Page { provider: state.provider().to_string() }
        };

        Ok(CallbackOutcome { target, platform: state.platform() })
    }

    /// Verify the caller of a token request.
    ///
    /// A present assertion is authoritative: if it fails verification the
    /// request is rejected without trying the challenge. Otherwise a
    /// matching `(user_id, challenge)` is consumed and a fresh assertion is
    /// minted for future requests.
    ///
    /// # Errors
    /// `Unauthorized` when neither path verifies the caller.
    pub fn authenticate(&self, credentials: &Credentials) -> Result<Authentication> {
        if let Some(assertion) = credentials.assertion.as_deref().filter(|a| !a.is_empty()) {
            let verified = self.signer.verify(assertion).map_err(|e| {
                debug!(reason = e.code(), "assertion rejected");
                BridgeError::Unauthorized(e.to_string())
            })?;
            return Ok(Authentication {
                user_id: verified.subject,
                method: AuthMethod::Assertion,
                issued_assertion: None,
            });
        }

        let user_id = credentials.user_id.as_deref().filter(|u| !u.is_empty());
        let challenge = credentials.challenge.as_deref().filter(|c| !c.is_empty());
        let (Some(user_id), Some(challenge)) = (user_id, challenge) else {
            return Err(BridgeError::Unauthorized("no assertion or challenge presented".into()));
        };

        if self.challenges.consume(user_id, challenge).is_none() {
            return Err(BridgeError::Unauthorized("challenge verification failed".into()));
        }

        let issued = self
            .signer
            .issue(user_id)
            .map_err(|e| BridgeError::Internal(format!("failed to issue assertion: {e}")))?;

        Ok(Authentication {
            user_id: user_id.to_string(),
            method: AuthMethod::Challenge,
            issued_assertion: Some(issued),
        })
    }

    /// Produce an access token for `(provider, user_id)`.
    ///
    /// Persistent mode always refreshes from the stored refresh token and
    /// writes back a rotated one when the provider returns a different value.
    /// That write is best-effort. Ephemeral mode hands out the cached set once.
    ///
    /// # Errors
    /// - `NotLoggedIn` when nothing is stored or the ephemeral entry is gone
    /// - `DecryptFailed` for unreadable stored ciphertext
    /// - `UnknownProvider`, `RefreshFailed`, `Store`
    pub async fn retrieve_access_token(
        &self,
        provider: &str,
        user_id: &str,
        mode: CacheMode,
    ) -> Result<TokenSet> {
        match mode {
            CacheMode::Ephemeral => self.ephemeral.take(user_id).ok_or_else(|| {
                BridgeError::NotLoggedIn(format!("no ephemeral token for '{user_id}'"))
            }),
            CacheMode::Persistent => self.refresh_persistent(provider, user_id).await,
        }
    }

    /// Authenticate the caller and return the token payload.
    ///
    /// # Errors
    /// `BadRequest` without a provider, plus anything from
    /// [`authenticate`](Self::authenticate) and
    /// [`retrieve_access_token`](Self::retrieve_access_token).
    pub async fn get_token(&self, request: GetTokenRequest) -> Result<TokenPayload> {
        if request.provider.is_empty() {
            return Err(BridgeError::BadRequest("provider is required".into()));
        }

        let auth = self.authenticate(&request.credentials)?;
        let tokens =
            self.retrieve_access_token(&request.provider, &auth.user_id, request.cache_mode).await?;

        info!(
            provider = %request.provider,
            cache_mode = %request.cache_mode,
            method = ?auth.method,
            "access token delivered"
        );
        Ok(TokenPayload::from_tokens(request.cache_mode, tokens, auth.issued_assertion))
    }

    async fn client_config(&self, provider: &str) -> Result<ProviderClientConfig> {
        self.clients
            .get(provider)
            .await?
            .ok_or_else(|| BridgeError::UnknownProvider(provider.to_string()))
    }

    async fn store_refresh_token(&self, state: &FlowState, tokens: &TokenSet) -> Result<()> {
        let refresh_token = tokens.refresh_token().ok_or_else(|| {
            BridgeError::ExchangeFailed("provider returned no refresh token".into())
        })?;

        let sealed = self
            .cipher
            .encrypt_to_string(refresh_token)
            .map_err(|e| BridgeError::Internal(format!("failed to encrypt refresh token: {e}")))?;

        self.tokens.upsert(TokenRecord::new(state.provider(), state.user_id(), sealed)).await
    }

    async fn refresh_persistent(&self, provider: &str, user_id: &str) -> Result<TokenSet> {
        let record = self.tokens.load(provider, user_id).await?.ok_or_else(|| {
            BridgeError::NotLoggedIn(format!("no stored token for '{user_id}' at '{provider}'"))
        })?;

        let refresh_token = self
            .cipher
            .decrypt_from_string(&record.encrypted_refresh_token)
            .map_err(|e| BridgeError::DecryptFailed(e.to_string()))?;

        let client = self.client_config(&record.provider).await?;
        let tokens = self.provider.refresh(&client, &refresh_token).await?;

        if let Some(rotated) = tokens.refresh_token().filter(|rt| *rt != refresh_token) {
            if let Err(err) = self.rotate(&record, rotated).await {
                warn!(
                    provider = %record.provider,
                    error = %err,
                    kind = err.label(),
                    "failed to persist rotated refresh token"
                );
            }
        }

        Ok(tokens)
    }

    async fn rotate(&self, record: &TokenRecord, refresh_token: &str) -> Result<()> {
        let sealed = self
            .cipher
            .encrypt_to_string(refresh_token)
            .map_err(|e| BridgeError::Internal(format!("failed to encrypt refresh token: {e}")))?;
        self.tokens
            .upsert(TokenRecord::new(record.provider.clone(), record.user_id.clone(), sealed))
            .await?;
        debug!(provider = %record.provider, "refresh token rotated");
        Ok(())
    }

    fn deep_link(&self, state: &FlowState) -> Result<String> {
        let scheme = if state.return_scheme().is_empty() {
            self.settings.default_return_scheme.as_str()
        } else {
            state.return_scheme()
        };

        let jwt = self
            .signer
            .issue(state.user_id())
            .map_err(|e| BridgeError::Internal(format!("failed to issue assertion: {e}")))?;

        Ok(format!(
            "{scheme}://{path}?jwt={jwt}&provider={provider}&user={user}",
            path = self.settings.mobile_callback_path.trim_start_matches('/'),
            jwt = urlencoding::encode(&jwt),
            provider = urlencoding::encode(state.provider()),
            user = urlencoding::encode(state.user_id()),
        ))
    }
}
