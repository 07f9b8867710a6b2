//! HTTP error mapping for the API handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by API handlers, mapped to JSON error responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session token was presented.
    #[error("unauthorized")]
    Unauthorized,

    /// The principal is not allowed to perform this operation.
    #[error("{0}")]
    Forbidden(String),

    /// The request payload failed validation.
    #[error("{0}")]
    BadRequest(String),

    /// The referenced resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// An internal failure; the detail is logged, not returned.
    #[error("internal error")]
    Internal,
}

impl From<staffline_db::DbError> for ApiError {
    fn from(err: staffline_db::DbError) -> Self {
        match err {
            staffline_db::DbError::NotFound(what) => Self::NotFound(what),
            other => {
                tracing::error!(error = %other, "database operation failed");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
