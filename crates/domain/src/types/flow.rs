//! Flow metadata carried through the provider's opaque `state` parameter.
//!
//! The wire form is a fixed-order, colon-delimited join:
//!
//! ```text
//! provider:user_id:platform:return_scheme:cache_mode
//! ```
//!
//! No field may contain the delimiter. [`FlowState::new`] rejects such values
//! up front so that [`FlowState::decode`] never has to guess where a field
//! ends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{STATE_DELIMITER, STATE_FIELD_COUNT};
use crate::errors::{BridgeError, Result};

/// Client platform that started the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
    Desktop,
    #[default]
    Other,
}

impl Platform {
    /// Lenient parse used for query parameters: unknown or empty values map
    /// to [`Platform::Other`].
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ios" => Self::Ios,
            "android" => Self::Android,
            "desktop" => Self::Desktop,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Desktop => "desktop",
            Self::Other => "other",
        }
    }

    /// Mobile platforms can be handed back to the app through a deep link.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        matches!(self, Self::Ios | Self::Android)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the provider tokens obtained at callback time are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    /// Encrypted refresh token in the token store; refreshable indefinitely.
    #[default]
    Persistent,
    /// Full token set in process memory; delivered once, then gone.
    Ephemeral,
}

impl CacheMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::Ephemeral => "ephemeral",
        }
    }

    /// Parse an optional query parameter; absent or empty means
    /// [`CacheMode::Persistent`].
    pub fn from_param(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(value) => value.parse(),
        }
    }
}

impl FromStr for CacheMode {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "persistent" => Ok(Self::Persistent),
            "ephemeral" => Ok(Self::Ephemeral),
            other => Err(BridgeError::BadRequest(format!("unsupported cacheMode '{other}'"))),
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flow metadata round-tripped through the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowState {
    provider: String,
    user_id: String,
    platform: Platform,
    return_scheme: String,
    cache_mode: CacheMode,
}

impl FlowState {
    /// Build a flow state, validating it can be encoded unambiguously.
    ///
    /// # Errors
    /// `BadRequest` if `provider` or `user_id` is empty, or if any field
    /// contains the state delimiter.
    pub fn new(
        provider: impl Into<String>,
        user_id: impl Into<String>,
        platform: Platform,
        return_scheme: impl Into<String>,
        cache_mode: CacheMode,
    ) -> Result<Self> {
        let state = Self {
            provider: provider.into(),
            user_id: user_id.into(),
            platform,
            return_scheme: return_scheme.into(),
            cache_mode,
        };

        if state.provider.is_empty() || state.user_id.is_empty() {
            return Err(BridgeError::BadRequest("provider and user_id are required".into()));
        }

        for (name, value) in [
            ("provider", &state.provider),
            ("user_id", &state.user_id),
            ("scheme", &state.return_scheme),
        ] {
            if value.contains(STATE_DELIMITER) {
                return Err(BridgeError::BadRequest(format!(
                    "{name} must not contain '{STATE_DELIMITER}'"
                )));
            }
        }

        if !state.return_scheme.is_empty() && !is_uri_scheme(&state.return_scheme) {
            return Err(BridgeError::BadRequest(format!(
                "scheme '{}' is not a valid URI scheme",
                state.return_scheme
            )));
        }

        Ok(state)
    }

    /// Serialize into the provider-visible `state` string.
    #[must_use]
    pub fn encode(&self) -> String {
        let delimiter = STATE_DELIMITER.to_string();
        [
            self.provider.as_str(),
            self.user_id.as_str(),
            self.platform.as_str(),
            self.return_scheme.as_str(),
            self.cache_mode.as_str(),
        ]
        .join(&delimiter)
    }

    /// Parse a `state` string received on the provider callback.
    ///
    /// # Errors
    /// `InvalidState` if the field count is wrong, a required field is
    /// empty, or the cache mode is unrecognised.
    pub fn decode(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split(STATE_DELIMITER).collect();
        if parts.len() != STATE_FIELD_COUNT {
            return Err(BridgeError::InvalidState(format!(
                "expected {STATE_FIELD_COUNT} fields, found {}",
                parts.len()
            )));
        }

        let (provider, user_id) = (parts[0], parts[1]);
        if provider.is_empty() || user_id.is_empty() {
            return Err(BridgeError::InvalidState("provider and user_id are required".into()));
        }

        let cache_mode = CacheMode::from_param(Some(parts[4]))
            .map_err(|_| BridgeError::InvalidState(format!("unknown cache mode '{}'", parts[4])))?;

        Ok(Self {
            provider: provider.to_string(),
            user_id: user_id.to_string(),
            platform: Platform::parse_lenient(parts[2]),
            return_scheme: parts[3].to_string(),
            cache_mode,
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn return_scheme(&self) -> &str {
        &self.return_scheme
    }

    pub fn cache_mode(&self) -> CacheMode {
        self.cache_mode
    }
}

/// RFC 3986 scheme: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
fn is_uri_scheme(raw: &str) -> bool {
    let mut chars = raw.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
