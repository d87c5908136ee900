//! OAuth 2.0 types and structures
//!
//! Wire shapes for token-endpoint responses and the per-provider client
//! configuration the HTTP client is built from.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OAuth 2.0 access and refresh tokens with metadata
///
/// - Optional refresh token (refresh grants frequently omit it)
/// - Both `expires_in` (duration) and `expires_at` (timestamp)
/// - ID token support for OpenID Connect providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token for provider API calls
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// ID token (JWT) containing user claims (OpenID Connect)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Token type (`Bearer` unless the provider says otherwise)
    pub token_type: String,

    /// Access token lifetime in seconds (0 when the provider gave none)
    pub expires_in: i64,

    /// Absolute expiration timestamp (UTC), computed when the set was built
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Granted scopes (space-separated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    /// Create a new `TokenSet` with calculated expiration time
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        id_token: Option<String>,
        expires_in: i64,
        scope: Option<String>,
    ) -> Self {
        let expires_at = if expires_in > 0 {
            Some(Utc::now() + chrono::Duration::seconds(expires_in))
        } else {
            None
        };

        Self {
            access_token,
            refresh_token,
            id_token,
            token_type: "Bearer".to_string(),
            expires_in,
            expires_at,
            scope,
        }
    }

    /// Override the token type reported by the provider
    #[must_use]
    pub fn with_token_type(mut self, token_type: impl Into<String>) -> Self {
        let token_type = token_type.into();
        if !token_type.is_empty() {
            self.token_type = token_type;
        }
        self
    }

    /// Non-empty refresh token, if one was issued
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|token| !token.is_empty())
    }
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// OAuth token response from authorization server
///
/// Standard OAuth 2.0 token response format (RFC 6749 §5.1). `token_type`
/// and `expires_in` are tolerated when absent.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        Self::new(
            response.access_token,
            response.refresh_token,
            response.id_token,
            response.expires_in,
            response.scope,
        )
        .with_token_type(response.token_type)
    }
}

/// Client registration for one authorization server
#[derive(Clone)]
pub struct OAuthConfig {
    /// OAuth client ID
    pub client_id: String,

    /// Client secret (confidential clients; empty for public clients)
    pub client_secret: String,

    /// Redirect URI registered with the provider
    pub redirect_uri: String,

    /// Scopes to request
    pub scopes: Vec<String>,

    /// Authorization endpoint
    pub auth_url: String,

    /// Token endpoint
    pub token_url: String,
}

impl OAuthConfig {
    /// Create a new OAuth configuration
    #[must_use]
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        scopes: Vec<String>,
        auth_url: String,
        token_url: String,
    ) -> Self {
        Self { client_id, client_secret, redirect_uri, scopes, auth_url, token_url }
    }

    /// Scopes as a space-separated string
    #[must_use]
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Client secret, if configured
    #[must_use]
    pub fn client_secret(&self) -> Option<&str> {
        Some(self.client_secret.as_str()).filter(|secret| !secret.is_empty())
    }

    /// Authorization endpoint URL for a code flow carrying `state`
    ///
    /// Always asks for offline access with forced consent so a refresh token
    /// is issued on every completed flow.
    #[must_use]
    pub fn authorization_url(&self, state: &str, login_hint: Option<&str>) -> String {
        let mut params = vec![
            ("response_type", "code".to_string()),
            ("client_id", self.client_id.clone()),
            ("redirect_uri", self.redirect_uri.clone()),
            ("scope", self.scope_string()),
            ("state", state.to_string()),
            ("access_type", "offline".to_string()),
            ("prompt", "consent".to_string()),
        ];

        if let Some(hint) = login_hint.filter(|hint| !hint.is_empty()) {
            params.push(("login_hint", hint.to_string()));
        }

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let separator = if self.auth_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query_string}", self.auth_url)
    }
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// OAuth error response from authorization server
///
/// Standard OAuth 2.0 error response format (RFC 6749 §5.2).
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}
