//! In-memory port implementations
//!
//! Deterministic stand-ins for the SQLite repositories and the provider
//! token endpoint.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use authbridge_common::auth::TokenSet;
use authbridge_core::{ClientConfigStore, ProviderClient, TokenStore};
use authbridge_domain::{BridgeError, ProviderClientConfig, Result as DomainResult, TokenRecord};
use parking_lot::Mutex;

/// In-memory `TokenStore` keyed case-insensitively, like the SQLite store.
#[derive(Default)]
pub struct InMemoryTokenStore {
    records: Mutex<HashMap<(String, String), TokenRecord>>,
    fail_writes: Mutex<bool>,
    writes: Mutex<usize>,
}

impl InMemoryTokenStore {
    /// Make every subsequent `upsert` fail with a storage error.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    pub fn get(&self, provider: &str, user_id: &str) -> Option<TokenRecord> {
        self.records.lock().get(&key(provider, user_id)).cloned()
    }

    pub fn insert(&self, record: TokenRecord) {
        self.records.lock().insert(key(&record.provider, &record.user_id), record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }
}

fn key(provider: &str, user_id: &str) -> (String, String) {
    (provider.to_lowercase(), user_id.to_lowercase())
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self, provider: &str, user_id: &str) -> DomainResult<Option<TokenRecord>> {
        Ok(self.get(provider, user_id))
    }

    async fn upsert(&self, record: TokenRecord) -> DomainResult<()> {
        if *self.fail_writes.lock() {
            return Err(BridgeError::Store("disk full".into()));
        }
        *self.writes.lock() += 1;
        self.insert(record);
        Ok(())
    }
}

/// In-memory `ClientConfigStore`.
#[derive(Default)]
pub struct InMemoryClientStore {
    clients: Mutex<HashMap<String, ProviderClientConfig>>,
}

impl InMemoryClientStore {
    pub fn with(client: ProviderClientConfig) -> Self {
        let store = Self::default();
        store.clients.lock().insert(client.provider.clone(), client);
        store
    }
}

#[async_trait]
impl ClientConfigStore for InMemoryClientStore {
    async fn get(&self, provider: &str) -> DomainResult<Option<ProviderClientConfig>> {
        Ok(self.clients.lock().get(provider).cloned())
    }

    async fn upsert(&self, config: ProviderClientConfig) -> DomainResult<()> {
        self.clients.lock().insert(config.provider.clone(), config);
        Ok(())
    }
}

/// Scripted provider token endpoint.
///
/// Each call pops the next queued response; an empty queue answers with an
/// error of the matching kind.
#[derive(Default)]
pub struct FakeProviderClient {
    exchange_responses: Mutex<VecDeque<DomainResult<TokenSet>>>,
    refresh_responses: Mutex<VecDeque<DomainResult<TokenSet>>>,
    codes: Mutex<Vec<String>>,
    refresh_tokens: Mutex<Vec<String>>,
}

impl FakeProviderClient {
    pub fn queue_exchange(&self, response: DomainResult<TokenSet>) {
        self.exchange_responses.lock().push_back(response);
    }

    pub fn queue_refresh(&self, response: DomainResult<TokenSet>) {
        self.refresh_responses.lock().push_back(response);
    }

    /// Codes seen by `exchange_code`, in call order.
    pub fn exchanged_codes(&self) -> Vec<String> {
        self.codes.lock().clone()
    }

    /// Refresh tokens seen by `refresh`, in call order.
    pub fn refreshed_with(&self) -> Vec<String> {
        self.refresh_tokens.lock().clone()
    }
}

#[async_trait]
impl ProviderClient for FakeProviderClient {
    async fn exchange_code(
        &self,
        _client: &ProviderClientConfig,
        code: &str,
    ) -> DomainResult<TokenSet> {
        self.codes.lock().push(code.to_string());
        self.exchange_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(BridgeError::ExchangeFailed("invalid_grant".into())))
    }

    async fn refresh(
        &self,
        _client: &ProviderClientConfig,
        refresh_token: &str,
    ) -> DomainResult<TokenSet> {
        self.refresh_tokens.lock().push(refresh_token.to_string());
        self.refresh_responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(BridgeError::RefreshFailed("invalid_grant".into())))
    }
}
