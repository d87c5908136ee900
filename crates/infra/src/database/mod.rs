//! Database implementations

pub mod client_config_repository;
pub mod manager;
pub mod token_repository;

pub use client_config_repository::SqliteClientConfigRepository;
pub use manager::DbManager;
pub use token_repository::SqliteTokenRepository;
