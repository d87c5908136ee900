//! AuthBridge - OAuth2 authorization-code broker
//!
//! Main entry point for the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use authbridge_api::utils::logging::init_logging;
use authbridge_api::{build_router, AppContext};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let config = authbridge_infra::config::load().context("failed to load configuration")?;
    let bind_addr = config.server.bind_addr.clone();

    let ctx = Arc::new(AppContext::new(config).await.context("failed to build context")?);
    let purge = ctx.spawn_purge();

    let listener =
        TcpListener::bind(&bind_addr).await.with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(addr = %bind_addr, "authbridge listening");

    let app = build_router(Arc::clone(&ctx));
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    purge.abort();
    info!("authbridge stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}
