//! Single-use challenges registered at authorize time.

pub mod registry;

pub use registry::ChallengeRegistry;
