//! # AuthBridge Domain
//!
//! Business domain types for the AuthBridge OAuth2 broker.
//!
//! This crate contains:
//! - Flow metadata round-tripped through the provider `state` parameter
//! - Persisted record shapes (refresh-token records, provider client config)
//! - Configuration structures
//! - The error taxonomy shared by every layer
//!
//! ## Architecture
//! - No dependencies on other AuthBridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
