//! Shared error handling for API endpoints.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::auth::AuthError;

/// Extension trait for mapping flow errors to endpoint-specific responses.
pub trait ResultExt<T> {
    /// Map `AuthError::Failure` to a 401 with the given message.
    fn auth_err(self, msg: &'static str) -> Result<T, ApiError>;
}

impl<T> ResultExt<T> for Result<T, AuthError> {
    fn auth_err(self, msg: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| match e {
            AuthError::Failure => ApiError::unauthorized(msg),
            AuthError::Internal => ApiError::internal(),
        })
    }
}

/// API error type with automatic response conversion.
/// Messages are fixed strings; internal details are logged where they occur.
#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    Unauthorized(&'static str),
    Internal,
}

impl ApiError {
    pub fn unauthorized(msg: &'static str) -> Self {
        Self::Unauthorized(msg)
    }

    pub fn internal() -> Self {
        Self::Internal
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        let mut response = (status, Json(ErrorResponse { error: message })).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
