//! Configuration loading
//!
//! Reads the broker configuration from files and environment variables.

pub mod loader;

// Re-export commonly used items
pub use loader::{apply_env_overrides, apply_overrides, load, load_from_file, probe_config_paths};
