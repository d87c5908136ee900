//! One-shot, memory-only token delivery.

pub mod cache;

pub use cache::EphemeralTokenCache;
