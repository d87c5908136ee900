//! Utility modules for the HTTP layer

pub mod logging;
