//! Configuration structures
//!
//! Every section has serde defaults so a partial file (or none at all) plus
//! the two required secrets is a complete configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ASSERTION_TTL_SECS, DEFAULT_BIND_ADDR, DEFAULT_CHALLENGE_TTL_SECS, DEFAULT_DB_PATH,
    DEFAULT_DB_POOL_SIZE, DEFAULT_EPHEMERAL_TTL_SECS, DEFAULT_MOBILE_CALLBACK_PATH,
    DEFAULT_RETURN_SCHEME,
};
use crate::errors::{BridgeError, Result};
use crate::types::ProviderClientConfig;

/// Top-level broker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub flow: FlowConfig,
    /// Provider client registrations seeded into the store at startup.
    #[serde(default)]
    pub providers: Vec<ProviderClientConfig>,
}

impl AppConfig {
    /// Check that the configuration can start a broker.
    ///
    /// # Errors
    /// Returns `BridgeError::Config` if a secret is missing, the pool size is
    /// zero, or a provider entry is incomplete.
    pub fn validate(&self) -> Result<()> {
        self.security.validate()?;

        if self.database.pool_size == 0 {
            return Err(BridgeError::Config("database.pool_size must be at least 1".into()));
        }

        if self.flow.assertion_ttl_secs == 0 {
            return Err(BridgeError::Config("flow.assertion_ttl_secs must be positive".into()));
        }

        for provider in &self.providers {
            if provider.provider.is_empty() || provider.client_id.is_empty() {
                return Err(BridgeError::Config(
                    "provider entries need a name and client_id".into(),
                ));
            }
            if provider.auth_url.is_empty() || provider.token_url.is_empty() {
                return Err(BridgeError::Config(format!(
                    "provider '{}' is missing auth_url or token_url",
                    provider.provider
                )));
            }
        }

        Ok(())
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr() }
    }
}

/// SQLite store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path(), pool_size: default_pool_size() }
    }
}

/// Process secrets
///
/// Both values are required. They are normally supplied through `TOKEN_KEY`
/// and `JWT_SECRET` rather than a config file.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Secret from which the refresh-token encryption key is derived.
    #[serde(default)]
    pub token_key: String,
    /// HMAC secret for signed assertions.
    #[serde(default)]
    pub assertion_secret: String,
}

impl SecurityConfig {
    /// # Errors
    /// Returns `BridgeError::Config` naming the first missing secret.
    pub fn validate(&self) -> Result<()> {
        if self.token_key.is_empty() {
            return Err(BridgeError::Config("TOKEN_KEY is required".into()));
        }
        if self.assertion_secret.is_empty() {
            return Err(BridgeError::Config("JWT_SECRET is required".into()));
        }
        Ok(())
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("token_key", &redact(&self.token_key))
            .field("assertion_secret", &redact(&self.assertion_secret))
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Authorization flow tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Lifetime of issued assertions (seconds).
    #[serde(default = "default_assertion_ttl")]
    pub assertion_ttl_secs: u64,
    /// Lifetime of registered challenges (seconds). Zero disables expiry.
    #[serde(default = "default_challenge_ttl")]
    pub challenge_ttl_secs: u64,
    /// Lifetime of unclaimed ephemeral tokens (seconds). Zero disables expiry.
    #[serde(default = "default_ephemeral_ttl")]
    pub ephemeral_ttl_secs: u64,
    /// Scheme used for mobile deep links when the client supplied none.
    #[serde(default = "default_return_scheme")]
    pub default_return_scheme: String,
    /// Path appended to `{scheme}://` for mobile deep links.
    #[serde(default = "default_mobile_callback_path")]
    pub mobile_callback_path: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            assertion_ttl_secs: default_assertion_ttl(),
            challenge_ttl_secs: default_challenge_ttl(),
            ephemeral_ttl_secs: default_ephemeral_ttl(),
            default_return_scheme: default_return_scheme(),
            mobile_callback_path: default_mobile_callback_path(),
        }
    }
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_pool_size() -> u32 {
    DEFAULT_DB_POOL_SIZE
}

fn default_assertion_ttl() -> u64 {
    DEFAULT_ASSERTION_TTL_SECS
}

fn default_challenge_ttl() -> u64 {
    DEFAULT_CHALLENGE_TTL_SECS
}

fn default_ephemeral_ttl() -> u64 {
    DEFAULT_EPHEMERAL_TTL_SECS
}

fn default_return_scheme() -> String {
    DEFAULT_RETURN_SCHEME.to_string()
}

fn default_mobile_callback_path() -> String {
    DEFAULT_MOBILE_CALLBACK_PATH.to_string()
}
