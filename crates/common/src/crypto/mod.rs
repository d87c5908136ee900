//! Symmetric encryption for secrets persisted at rest.

pub mod encryption;

pub use encryption::{CryptoError, TokenCipher};
