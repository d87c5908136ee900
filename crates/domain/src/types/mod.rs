//! Domain types and models

pub mod client;
pub mod flow;
pub mod token;

pub use client::ProviderClientConfig;
pub use flow::{CacheMode, FlowState, Platform};
pub use token::TokenRecord;
