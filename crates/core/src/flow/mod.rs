//! Authorization-code flow orchestration

pub mod ports;
pub mod service;
pub mod types;

pub use service::{FlowDependencies, FlowService, FlowSettings};
