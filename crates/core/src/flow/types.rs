//! Request and response shapes for `FlowService`.

use authbridge_common::auth::TokenSet;
use authbridge_domain::{CacheMode, Platform};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Input to [`FlowService::start_flow`](super::FlowService::start_flow).
#[derive(Debug, Clone, Default)]
pub struct StartFlowRequest {
    pub provider: String,
    pub user_id: String,
    pub platform: Platform,
    /// Deep-link scheme for mobile callbacks; the configured default applies
    /// when absent.
    pub return_scheme: Option<String>,
    /// Single-use challenge to register before redirecting.
    pub challenge: Option<String>,
    pub cache_mode: CacheMode,
}

/// Where the user agent goes after the provider callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Mobile: redirect into the native app.
    DeepLink(String),
    /// Desktop and unknown platforms: a terminal confirmation page.
    Page { provider: String },
}

/// Result of [`FlowService::complete_flow`](super::FlowService::complete_flow).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub target: RedirectTarget,
    pub platform: Platform,
}

/// Credentials presented on a token request.
///
/// `assertion` is the bearer token from the `Authorization` header, already
/// extracted; `user_id` and `challenge` come from the query string.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub assertion: Option<String>,
    pub user_id: Option<String>,
    pub challenge: Option<String>,
}

/// Which path verified the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Assertion,
    Challenge,
}

/// A verified caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    pub user_id: String,
    pub method: AuthMethod,
    /// Fresh assertion minted after a successful challenge.
    pub issued_assertion: Option<String>,
}

/// Input to [`FlowService::get_token`](super::FlowService::get_token).
#[derive(Debug, Clone, Default)]
pub struct GetTokenRequest {
    pub provider: String,
    pub cache_mode: CacheMode,
    pub credentials: Credentials,
}

/// JSON body answered by `/get_token`.
///
/// The shape depends on the cache mode the tokens were delivered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TokenPayload {
    Persistent {
        access_token: String,
        token_type: String,
        expiry: Option<DateTime<Utc>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        jwt: Option<String>,
    },
    Ephemeral {
        access_token: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        refresh_token: Option<String>,
        token_type: String,
        expiry: Option<DateTime<Utc>>,
        expires_in: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        jwt: Option<String>,
    },
}

impl TokenPayload {
    /// Build the payload for tokens delivered in `mode`.
    #[must_use]
    pub fn from_tokens(mode: CacheMode, tokens: TokenSet, jwt: Option<String>) -> Self {
        match mode {
            CacheMode::Persistent => Self::Persistent {
                access_token: tokens.access_token,
                token_type: tokens.token_type,
                expiry: tokens.expires_at,
                jwt,
            },
            CacheMode::Ephemeral => Self::Ephemeral {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token.filter(|token| !token.is_empty()),
                token_type: tokens.token_type,
                expiry: tokens.expires_at,
                expires_in: tokens.expires_in,
                jwt,
            },
        }
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        match self {
            Self::Persistent { access_token, .. } | Self::Ephemeral { access_token, .. } => {
                access_token
            }
        }
    }

    #[must_use]
    pub fn jwt(&self) -> Option<&str> {
        match self {
            Self::Persistent { jwt, .. } | Self::Ephemeral { jwt, .. } => jwt.as_deref(),
        }
    }
}
