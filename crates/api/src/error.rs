//! HTTP mapping for broker errors.

use authbridge_domain::BridgeError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

/// Handler error: a [`BridgeError`] rendered as a plain-text response.
#[derive(Debug)]
pub struct ApiError(pub BridgeError);

impl From<BridgeError> for ApiError {
    fn from(value: BridgeError) -> Self {
        Self(value)
    }
}

impl ApiError {
    /// Status code for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BridgeError::BadRequest(_)
            | BridgeError::InvalidState(_)
            | BridgeError::UnknownProvider(_) => StatusCode::BAD_REQUEST,
            BridgeError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BridgeError::NotLoggedIn(_) => StatusCode::NOT_FOUND,
            BridgeError::ExchangeFailed(_)
            | BridgeError::RefreshFailed(_)
            | BridgeError::DecryptFailed(_)
            | BridgeError::Store(_)
            | BridgeError::Config(_)
            | BridgeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text body.
    pub fn body(&self) -> String {
        match &self.0 {
            BridgeError::InvalidState(_) => "invalid state".to_string(),
            BridgeError::BadRequest(msg)
            | BridgeError::UnknownProvider(msg)
            | BridgeError::Unauthorized(msg)
            | BridgeError::ExchangeFailed(msg)
            | BridgeError::RefreshFailed(msg)
            | BridgeError::NotLoggedIn(msg)
            | BridgeError::DecryptFailed(msg)
            | BridgeError::Store(msg)
            | BridgeError::Config(msg)
            | BridgeError::Internal(msg) => format!("{}: {msg}", self.0.label()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_client_error() {
            warn!(error_type = self.0.label(), error = %self.0, "request rejected");
        } else {
            error!(error_type = self.0.label(), error = %self.0, "request failed");
        }
        (status, self.body()).into_response()
    }
}
