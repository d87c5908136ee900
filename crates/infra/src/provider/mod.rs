//! Provider token endpoint adapters

pub mod http_client;

pub use http_client::HttpProviderClient;
