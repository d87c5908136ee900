//! Shared test helpers for `authbridge-core` integration tests.
//!
//! In-memory port implementations plus a harness that wires them into a
//! `FlowService`, so flow tests can focus on behaviour.

#![allow(dead_code)]

pub mod fakes;

use std::sync::Arc;
use std::time::Duration;

use authbridge_common::auth::{AssertionSigner, TokenSet};
use authbridge_common::crypto::TokenCipher;
use authbridge_core::{
    ChallengeRegistry, EphemeralTokenCache, FlowDependencies, FlowService, FlowSettings,
};
use authbridge_domain::ProviderClientConfig;

pub use fakes::{FakeProviderClient, InMemoryClientStore, InMemoryTokenStore};

pub const TOKEN_KEY: &str = "core-test-token-key";
pub const ASSERTION_SECRET: &str = "core-test-assertion-secret";

/// A `FlowService` plus handles on every fake behind it.
pub struct Harness {
    pub service: FlowService,
    pub tokens: Arc<InMemoryTokenStore>,
    pub clients: Arc<InMemoryClientStore>,
    pub provider: Arc<FakeProviderClient>,
    pub challenges: Arc<ChallengeRegistry>,
    pub ephemeral: Arc<EphemeralTokenCache>,
    pub cipher: TokenCipher,
    pub signer: AssertionSigner,
}

impl Harness {
    /// Harness with a `google` client registered.
    pub fn new() -> Self {
        let tokens = Arc::new(InMemoryTokenStore::default());
        let clients = Arc::new(InMemoryClientStore::with(google_client()));
        let provider = Arc::new(FakeProviderClient::default());
        let challenges = Arc::new(ChallengeRegistry::new(Duration::from_secs(600)));
        let ephemeral = Arc::new(EphemeralTokenCache::without_expiry());
        let cipher = TokenCipher::from_secret(TOKEN_KEY).expect("cipher");
        let signer = AssertionSigner::new(ASSERTION_SECRET, 86_400).expect("signer");

        let service = FlowService::new(
            FlowDependencies {
                clients: clients.clone(),
                tokens: tokens.clone(),
                provider: provider.clone(),
                cipher: cipher.clone(),
                signer: signer.clone(),
                challenges: challenges.clone(),
                ephemeral: ephemeral.clone(),
            },
            FlowSettings::default(),
        );

        Self { service, tokens, clients, provider, challenges, ephemeral, cipher, signer }
    }
}

pub fn google_client() -> ProviderClientConfig {
    ProviderClientConfig {
        provider: "google".into(),
        client_id: "google-client".into(),
        client_secret: "google-secret".into(),
        redirect_uri: "http://localhost:9090/callback".into(),
        scopes: vec!["openid".into(), "email".into()],
        auth_url: "https://accounts.example.com/o/oauth2/auth".into(),
        token_url: "https://oauth2.example.com/token".into(),
    }
}

pub fn token_set(access: &str, refresh: Option<&str>) -> TokenSet {
    TokenSet::new(access.to_string(), refresh.map(str::to_string), None, 3600, None)
}

/// Pull the decoded `state` query value out of an authorization URL.
pub fn state_from_url(url: &str) -> String {
    let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
    let raw = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("state="))
        .expect("state parameter present");
    urlencoding::decode(raw).expect("valid percent-encoding").into_owned()
}
