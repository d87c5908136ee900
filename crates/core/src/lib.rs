//! # AuthBridge Core
//!
//! Flow orchestration for the broker - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces for the token store, client configuration and the
//!   provider token endpoint
//! - The in-memory challenge registry and ephemeral token cache
//! - `FlowService`, which drives authorize → callback → token retrieval
//!
//! ## Architecture Principles
//! - Depends on `authbridge-common` and `authbridge-domain` only
//! - No database or HTTP server code
//! - All external effects via traits

pub mod challenge;
pub mod ephemeral;
pub mod flow;

pub use challenge::ChallengeRegistry;
pub use ephemeral::EphemeralTokenCache;
pub use flow::ports::{oauth_config_for, ClientConfigStore, ProviderClient, TokenStore};
pub use flow::types::{
    AuthMethod, Authentication, CallbackOutcome, Credentials, GetTokenRequest, RedirectTarget,
    StartFlowRequest, TokenPayload,
};
pub use flow::{FlowDependencies, FlowService, FlowSettings};
