//! OAuth 2.0 authorization-code plumbing and signed assertions
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  OAuthClient     │  authorize URL, code exchange, refresh (reqwest)
//! └──────────────────┘
//! ┌──────────────────┐
//! │ AssertionSigner  │  HS256 bearer assertions binding a user id
//! └──────────────────┘
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: Wire types (`TokenSet`, `TokenResponse`, `OAuthError`,
//!   `OAuthConfig`)
//! - **[`client`]**: Provider HTTP client
//! - **[`assertion`]**: Assertion issue/verify and bearer header parsing
//!
//! The client never retries. A failed exchange or refresh surfaces
//! immediately so the caller can restart the flow.

pub mod assertion;
pub mod client;
pub mod types;

// Re-export commonly used types and functions
pub use assertion::{AssertionClaims, AssertionError, AssertionSigner, VerifiedAssertion};
pub use client::{OAuthClient, OAuthClientError};
pub use types::{OAuthConfig, OAuthError, TokenResponse, TokenSet};
