//! `GET /healthz`

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use tokio::task;
use tracing::warn;

use crate::AppContext;

/// 200 `ok` when the database answers, 503 otherwise.
pub async fn healthz(State(ctx): State<Arc<AppContext>>) -> (StatusCode, &'static str) {
    let db = Arc::clone(&ctx.db);
    match task::spawn_blocking(move || db.health_check()).await {
        Ok(Ok(())) => (StatusCode::OK, "ok"),
        Ok(Err(err)) => {
            warn!(error = %err, "database health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
        Err(err) => {
            warn!(error = %err, "health check task failed");
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}
