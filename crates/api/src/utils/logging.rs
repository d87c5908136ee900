//! Logging bootstrap and per-request access log.

use std::net::SocketAddr;
use std::time::Instant;

use authbridge_domain::{BridgeError, Result};
use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,authbridge=debug";
const LOG_FORMAT_VAR: &str = "AUTHBRIDGE_LOG_FORMAT";

/// Install the global subscriber.
///
/// Honours `RUST_LOG`; `AUTHBRIDGE_LOG_FORMAT=json` switches to JSON lines.
///
/// # Errors
/// Returns `BridgeError::Config` if a subscriber is already installed.
pub fn init_logging() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(LOG_FORMAT_VAR).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry.with(tracing_subscriber::fmt::layer().json().with_current_span(false)).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_target(true).compact()).try_init()
    };

    result.map_err(|e| BridgeError::Config(format!("Failed to initialize logging: {e}")))
}

/// Access log middleware.
///
/// Records method, path, status, latency and peer address. The query string
/// is left out since it carries codes and challenges.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        warn!(%method, path = %path, status, elapsed_ms, remote = %remote, "http_request");
    } else {
        info!(%method, path = %path, status, elapsed_ms, remote = %remote, "http_request");
    }

    response
}
