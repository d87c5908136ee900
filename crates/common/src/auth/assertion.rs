//! Signed bearer assertions
//!
//! An assertion is an HS256 JWT with claims `{sub, iat, exp}`. It binds a
//! user identifier and nothing else; scope and provider are supplied by the
//! request that presents it.
//!
//! Expiry is checked against an explicit clock value with zero leeway, so a
//! token is valid for `iat <= now < exp`.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BEARER_PREFIX: &str = "Bearer ";

/// Claims carried by an assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Errors raised while issuing or verifying an assertion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssertionError {
    #[error("assertion signing secret must not be empty")]
    MissingSecret,

    #[error("assertion subject must not be empty")]
    EmptySubject,

    #[error("failed to sign assertion: {0}")]
    Signing(String),

    #[error("assertion expired")]
    Expired,

    #[error("assertion signature is invalid")]
    BadSignature,

    #[error("malformed assertion: {0}")]
    Malformed(String),
}

impl AssertionError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingSecret => "missing_secret",
            Self::EmptySubject => "empty_subject",
            Self::Signing(_) => "signing_failed",
            Self::Expired => "token_expired",
            Self::BadSignature => "invalid_signature",
            Self::Malformed(_) => "invalid_token",
        }
    }
}

/// Result of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAssertion {
    pub subject: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Issues and verifies assertions with a single process-wide secret.
#[derive(Clone)]
pub struct AssertionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl std::fmt::Debug for AssertionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertionSigner")
            .field("secret", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

impl AssertionSigner {
    /// Create a signer for assertions living `ttl_secs` seconds.
    ///
    /// # Errors
    /// Returns [`AssertionError::MissingSecret`] for an empty secret.
    pub fn new(secret: &str, ttl_secs: u64) -> Result<Self, AssertionError> {
        if secret.is_empty() {
            return Err(AssertionError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked in `verify_at` against the caller's clock.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        })
    }

    /// Configured lifetime in seconds.
    #[must_use]
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue an assertion for `subject` valid from now.
    pub fn issue(&self, subject: &str) -> Result<String, AssertionError> {
        self.issue_at(subject, Utc::now().timestamp())
    }

    /// Issue an assertion for `subject` as if the clock read `now`.
    pub fn issue_at(&self, subject: &str, now: i64) -> Result<String, AssertionError> {
        if subject.is_empty() {
            return Err(AssertionError::EmptySubject);
        }

        let claims = AssertionClaims {
            sub: subject.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AssertionError::Signing(e.to_string()))
    }

    /// Verify signature and expiry against the current time.
    pub fn verify(&self, token: &str) -> Result<VerifiedAssertion, AssertionError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify signature and expiry as if the clock read `now`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<VerifiedAssertion, AssertionError> {
        let claims = decode::<AssertionClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_decode_error)?;

        if now >= claims.exp {
            return Err(AssertionError::Expired);
        }
        if claims.sub.is_empty() {
            return Err(AssertionError::Malformed("sub claim is empty".into()));
        }

        Ok(VerifiedAssertion { subject: claims.sub, issued_at: claims.iat, expires_at: claims.exp })
    }

    /// Pull the token out of an `Authorization` header value.
    ///
    /// Returns `None` when the header is absent, uses another scheme, or
    /// carries nothing after `Bearer `. Such requests have no assertion at
    /// all; a present-but-invalid token is a verification failure instead.
    #[must_use]
    pub fn extract_bearer(header_value: Option<&str>) -> Option<&str> {
        let token = header_value?.trim_start().strip_prefix(BEARER_PREFIX)?.trim();
        if token.is_empty() {
            None
        } else {
            Some(token)
        }
    }
}

fn map_decode_error(error: jsonwebtoken::errors::Error) -> AssertionError {
    match error.kind() {
        ErrorKind::ExpiredSignature => AssertionError::Expired,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AssertionError::BadSignature,
        _ => AssertionError::Malformed(error.to_string()),
    }
}
