//! Modular common utilities shared across AuthBridge crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `runtime`: symmetric encryption of stored provider secrets
//! - `platform`: signed assertions, the provider OAuth2 HTTP client and the
//!   pooled SQLite storage layer

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod crypto;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod auth;
#[cfg(feature = "platform")]
pub mod storage;

// Re-export commonly used types for convenience
// ------------------------
#[cfg(feature = "platform")]
pub use auth::{AssertionError, AssertionSigner, OAuthClient, OAuthClientError, TokenSet};
#[cfg(feature = "runtime")]
pub use crypto::{CryptoError, TokenCipher};
#[cfg(feature = "platform")]
pub use storage::{StorageError, StorageResult};
