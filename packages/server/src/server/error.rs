//! Mapping of search engine errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use seeker::SeekerError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// The request itself is unusable
    BadRequest(String),
    Seeker(SeekerError),
}

impl From<SeekerError> for ApiError {
    fn from(err: SeekerError) -> Self {
        ApiError::Seeker(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Seeker(err) if err.is_not_found() => (StatusCode::NOT_FOUND, err.to_string()),
            ApiError::Seeker(err) => {
                tracing::error!(error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
