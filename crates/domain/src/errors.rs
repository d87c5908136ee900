//! Error types used throughout the broker

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for AuthBridge
///
/// Every failure a caller can observe is one of these variants. The HTTP
/// layer maps them onto status codes; nothing here is retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum BridgeError {
    /// Missing or malformed request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The provider `state` parameter could not be parsed into a flow.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// No OAuth2 client configuration exists for the provider.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Assertion or challenge verification failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The provider rejected the authorization code or omitted a required
    /// refresh token.
    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    /// The provider rejected a refresh-token grant.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// No token is available for the user (never stored, or an ephemeral
    /// token was already consumed).
    #[error("not logged in: {0}")]
    NotLoggedIn(String),

    /// Stored ciphertext is truncated, tampered, or sealed with another key.
    #[error("decryption failed: {0}")]
    DecryptFailed(String),

    /// Underlying persistence failure.
    #[error("storage error: {0}")]
    Store(String),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Stable label for structured logging.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::InvalidState(_) => "invalid_state",
            Self::UnknownProvider(_) => "unknown_provider",
            Self::Unauthorized(_) => "unauthorized",
            Self::ExchangeFailed(_) => "exchange_failed",
            Self::RefreshFailed(_) => "refresh_failed",
            Self::NotLoggedIn(_) => "not_logged_in",
            Self::DecryptFailed(_) => "decrypt_failed",
            Self::Store(_) => "store_error",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the error was caused by the caller's input rather than by the
    /// broker or the provider.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::BadRequest(_)
                | Self::InvalidState(_)
                | Self::UnknownProvider(_)
                | Self::Unauthorized(_)
                | Self::NotLoggedIn(_)
        )
    }
}

/// Result type alias for AuthBridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;
