//! Persisted refresh-token record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One encrypted provider refresh token, unique per `(provider, user_id)`.
///
/// The refresh token is only ever held here in sealed form; callers decrypt it
/// for the duration of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub provider: String,
    pub user_id: String,
    /// Base64 of `nonce || ciphertext` produced by the token cipher.
    pub encrypted_refresh_token: String,
    pub updated_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(
        provider: impl Into<String>,
        user_id: impl Into<String>,
        encrypted_refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            user_id: user_id.into(),
            encrypted_refresh_token: encrypted_refresh_token.into(),
            updated_at: Utc::now(),
        }
    }
}
