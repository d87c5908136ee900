//! Per-provider OAuth2 client configuration.

use serde::{Deserialize, Serialize};

/// OAuth2 client registration for one provider, as stored in the
/// `oauth_clients` table (provider is the primary key).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderClientConfig {
    pub provider: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
}

impl ProviderClientConfig {
    /// Scopes in the comma-separated form used by the database column.
    #[must_use]
    pub fn scopes_csv(&self) -> String {
        self.scopes.join(",")
    }

    /// Parse the comma-separated database column back into scopes.
    #[must_use]
    pub fn parse_scopes(csv: &str) -> Vec<String> {
        csv.split(',')
            .map(str::trim)
            .filter(|scope| !scope.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

impl std::fmt::Debug for ProviderClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClientConfig")
            .field("provider", &self.provider)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}
