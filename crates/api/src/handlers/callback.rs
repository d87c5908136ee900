//! `GET /callback`

use std::sync::Arc;

use authbridge_core::RedirectTarget;
use authbridge_domain::BridgeError;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppContext;

/// Query string the provider redirects back with.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Exchange the code, then deep-link mobile clients back into the app or
/// show a confirmation page.
pub async fn callback(
    State(ctx): State<Arc<AppContext>>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    if let Some(error) = params.error.filter(|e| !e.is_empty()) {
        let message = match params.error_description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        };
        return Err(BridgeError::ExchangeFailed(message).into());
    }

    let state = params.state.unwrap_or_default();
    let code = params.code.unwrap_or_default();
    let outcome = ctx.flow.complete_flow(&state, &code).await?;

    Ok(match outcome.target {
        RedirectTarget::DeepLink(url) => {
            (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
        }
        RedirectTarget::Page { provider } => Html(success_page(&provider)).into_response(),
    })
}

fn success_page(provider: &str) -> String {
    let provider = escape_html(provider);
    format!("<html><h1>{provider} login successful! You can close this window.</h1></html>")
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
