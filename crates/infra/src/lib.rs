//! # AuthBridge Infrastructure
//!
//! Infrastructure implementations of core flow ports.
//!
//! This crate contains:
//! - SQLite repositories for refresh tokens and provider client registrations
//! - The reqwest-backed provider token endpoint client
//! - Configuration loading from files and environment
//!
//! ## Architecture
//! - Implements traits defined in `authbridge-core`
//! - Depends on `authbridge-common` and `authbridge-core`
//! - Contains all "impure" code (database and network I/O)

pub mod config;
pub mod database;
pub mod errors;
pub mod provider;

// Re-export commonly used items
pub use database::*;
pub use provider::*;
