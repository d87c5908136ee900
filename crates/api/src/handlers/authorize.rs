//! `GET /authorize`

use std::sync::Arc;

use authbridge_core::StartFlowRequest;
use authbridge_domain::{CacheMode, Platform};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppContext;

/// Query string of an authorization request.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeParams {
    pub provider: Option<String>,
    pub user_id: Option<String>,
    pub platform: Option<String>,
    pub scheme: Option<String>,
    pub challenge: Option<String>,
    #[serde(rename = "cacheMode")]
    pub cache_mode: Option<String>,
}

/// Register the optional challenge and redirect to the provider.
pub async fn authorize(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<AuthorizeParams>,
) -> Result<impl IntoResponse, ApiError> {
    let request = StartFlowRequest {
        provider: params.provider.unwrap_or_default(),
        user_id: params.user_id.unwrap_or_default(),
        platform: params.platform.as_deref().map(Platform::parse_lenient).unwrap_or_default(),
        return_scheme: params.scheme.filter(|s| !s.is_empty()),
        challenge: params.challenge,
        cache_mode: CacheMode::from_param(params.cache_mode.as_deref())?,
    };

    let url = ctx.flow.start_flow(request).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]))
}
