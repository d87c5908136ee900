//! # AuthBridge API
//!
//! HTTP surface of the broker: the axum router, its handlers, and the
//! [`AppContext`] that wires infrastructure adapters into the flow service.

pub mod context;
pub mod error;
pub mod handlers;
pub mod utils;

pub use context::AppContext;
pub use error::ApiError;
pub use handlers::build_router;
