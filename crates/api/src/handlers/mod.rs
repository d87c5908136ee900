//! HTTP handlers and router assembly.

pub mod authorize;
pub mod callback;
pub mod health;
pub mod token;

use std::sync::Arc;

use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::utils::logging::log_request;
use crate::AppContext;

/// Build the broker router over a shared context.
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/authorize", get(authorize::authorize))
        .route("/callback", get(callback::callback))
        .route("/get_token", get(token::get_token))
        .route("/healthz", get(health::healthz))
        .layer(middleware::from_fn(log_request))
        .with_state(ctx)
}
