//! OAuth 2.0 authorization-code client
//!
//! Handles the provider side of a broker-mediated flow:
//! - Authorization URL building (offline access, forced consent)
//! - Authorization code exchange
//! - Token refresh

use std::time::Duration;

use reqwest::{Client, Response};

use super::types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed
    RequestFailed(reqwest::Error),

    /// OAuth server returned an RFC 6749 error body
    OAuthError(OAuthError),

    /// OAuth server returned a non-2xx status without a parseable error body
    HttpStatus { status: u16, body: String },

    /// Failed to parse response
    ParseError(String),

    /// No refresh token available
    NoRefreshToken,

    /// Invalid configuration
    ConfigError(String),
}

impl std::fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::OAuthError(e) => write!(f, "OAuth error: {e}"),
            Self::HttpStatus { status, body } => {
                write!(f, "token endpoint returned {status}: {body}")
            }
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
            Self::ConfigError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for OAuthClientError {}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// OAuth 2.0 client for one provider registration
///
/// Cheap to construct around a shared [`reqwest::Client`]; see
/// [`OAuthClient::with_http_client`].
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    client: Client,
}

impl OAuthClient {
    /// Create a new OAuth client with its own HTTP connection pool
    ///
    /// # Errors
    /// Returns `ConfigError` if the HTTP client cannot be built.
    pub fn new(config: OAuthConfig) -> Result<Self, OAuthClientError> {
        Ok(Self::with_http_client(config, Self::default_http_client()?))
    }

    /// Create a client that shares an existing HTTP connection pool
    #[must_use]
    pub fn with_http_client(config: OAuthConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Build the HTTP client used for token-endpoint calls (30s timeout).
    pub fn default_http_client() -> Result<Client, OAuthClientError> {
        Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OAuthClientError::ConfigError(format!("failed to build HTTP client: {e}")))
    }

    /// Generate the provider authorization URL
    ///
    /// Requests offline access and forced consent so the provider issues a
    /// refresh token on every completed flow. `login_hint` pre-selects the
    /// account on providers that support it.
    ///
    /// # Examples
    /// ```
    /// use authbridge_common::auth::{OAuthClient, OAuthConfig};
    ///
    /// let config = OAuthConfig::new(
    ///     "client_id".to_string(),
    ///     String::new(),
    ///     "http://localhost:9090/callback".to_string(),
    ///     vec!["openid".to_string()],
    ///     "https://accounts.example.com/o/oauth2/auth".to_string(),
    ///     "https://accounts.example.com/token".to_string(),
    /// );
    /// let client = OAuthClient::new(config)?;
    /// let url = client.authorization_url("google:alice:ios:myapp:persistent", Some("alice"));
    /// assert!(url.contains("access_type=offline"));
    /// # Ok::<(), authbridge_common::auth::OAuthClientError>(())
    /// ```
    #[must_use]
    pub fn authorization_url(&self, state: &str, login_hint: Option<&str>) -> String {
        self.config.authorization_url(state, login_hint)
    }

    /// Exchange an authorization code for tokens
    ///
    /// # Errors
    /// Returns error if the request fails, the provider rejects the code, or
    /// the response cannot be parsed.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, OAuthClientError> {
        if code.is_empty() {
            return Err(OAuthClientError::ConfigError("authorization code is empty".to_string()));
        }

        let mut request_body = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
            ("redirect_uri", self.config.redirect_uri.clone()),
            ("client_id", self.config.client_id.clone()),
        ];

        if let Some(secret) = self.config.client_secret() {
            request_body.push(("client_secret", secret.to_string()));
        }

        let response =
            self.client.post(&self.config.token_url).form(&request_body).send().await?;

        parse_token_response(response).await
    }

    /// Refresh access token using refresh token
    ///
    /// The returned set may or may not carry a new refresh token; providers
    /// that rotate include it, others omit it.
    ///
    /// # Errors
    /// Returns error if:
    /// - No refresh token provided
    /// - Refresh fails
    /// - Token is invalid/revoked
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let mut params = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token.to_string()),
            ("client_id", self.config.client_id.clone()),
        ];

        if let Some(secret) = self.config.client_secret() {
            params.push(("client_secret", secret.to_string()));
        }

        let response = self.client.post(&self.config.token_url).form(&params).send().await?;

        parse_token_response(response).await
    }
}

async fn parse_token_response(response: Response) -> Result<TokenSet, OAuthClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(match serde_json::from_str::<OAuthError>(&body) {
            Ok(error) => OAuthClientError::OAuthError(error),
            Err(_) => OAuthClientError::HttpStatus { status: status.as_u16(), body },
        });
    }

    let token_response: TokenResponse =
        serde_json::from_str(&body).map_err(|e| OAuthClientError::ParseError(e.to_string()))?;

    Ok(token_response.into())
}
