use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::error::CopilotError;

/// Error returned by every handler, rendered as `{ "error": "..." }`.
#[derive(Debug)]
pub struct ApiError(pub CopilotError);

impl From<CopilotError> for ApiError {
    fn from(error: CopilotError) -> Self {
        Self(error)
    }
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self(CopilotError::InvalidInput(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CopilotError::SessionExpired => StatusCode::UNAUTHORIZED,
            CopilotError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            CopilotError::NotFound(_) => StatusCode::NOT_FOUND,
            CopilotError::Api { .. } | CopilotError::Game { .. } | CopilotError::Http(_) | CopilotError::Broker => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("⚠️ Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
