use axum::Json;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use pokebot_core::AppError;
use serde::Serialize;
use tracing::error;

use crate::auth::ADMIN_REALM;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let payload = Json(ErrorResponse {
            message: self.0.to_string(),
        });
        let mut response = (status, payload).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(challenge) = HeaderValue::from_str(&format!("Basic realm=\"{ADMIN_REALM}\"")) {
                response.headers_mut().insert(WWW_AUTHENTICATE, challenge);
            }
        }

        response
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
