//! `GET /get_token`

use std::sync::Arc;

use authbridge_common::auth::AssertionSigner;
use authbridge_core::{Credentials, GetTokenRequest, TokenPayload};
use authbridge_domain::CacheMode;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppContext;

/// Query string of a token request.
#[derive(Debug, Default, Deserialize)]
pub struct TokenParams {
    pub provider: Option<String>,
    pub user_id: Option<String>,
    pub challenge: Option<String>,
    #[serde(rename = "cacheMode")]
    pub cache_mode: Option<String>,
}

/// Verify the caller and return an access token.
///
/// `Authorization: Bearer <assertion>` takes precedence over the
/// `user_id`/`challenge` pair.
pub async fn get_token(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
    Query(params): Query<TokenParams>,
) -> Result<Json<TokenPayload>, ApiError> {
    let authorization = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());

    let request = GetTokenRequest {
        provider: params.provider.unwrap_or_default(),
        cache_mode: CacheMode::from_param(params.cache_mode.as_deref())?,
        credentials: Credentials {
            assertion: AssertionSigner::extract_bearer(authorization).map(str::to_string),
            user_id: params.user_id,
            challenge: params.challenge,
        },
    };

    Ok(Json(ctx.flow.get_token(request).await?))
}
