//! Maps [`store::StoreError`] and malformed request bodies onto the HTTP
//! error envelope: `{"error": <reason>}` with a status code.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::types::ErrorResponse;

/// Error type returned by route handlers. Converts into the JSON error
/// envelope via [`IntoResponse`].
pub enum ApiError {
    /// Bad input: HTTP 400.
    Validation(String),
    /// WAL append or engine commit failure: HTTP 500.
    Io(String),
}

impl From<store::StoreError> for ApiError {
    fn from(e: store::StoreError) -> Self {
        match e {
            store::StoreError::Validation(msg) => ApiError::Validation(msg),
            store::StoreError::Io(err) => ApiError::Io(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::Validation(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            ApiError::Validation(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::Io(reason) => (StatusCode::INTERNAL_SERVER_ERROR, reason),
        };
        (status, Json(ErrorResponse { error: reason })).into_response()
    }
}
