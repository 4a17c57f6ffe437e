//! API error type and its HTTP mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::json;

/// Errors returned by API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A back-office operation failed.
    #[error(transparent)]
    Core(#[from] gastro_core::Error),

    /// No authenticated user and no development user configured.
    #[error("authentication required")]
    Unauthenticated,

    /// The request body was not valid JSON for the route.
    #[error("invalid body: {0}")]
    Body(#[from] JsonRejection),

    /// A path segment did not parse.
    #[error("invalid path: {0}")]
    Path(#[from] PathRejection),

    /// The query string did not parse.
    #[error("invalid query: {0}")]
    Query(#[from] QueryRejection),
}

/// Convenience alias for handler results.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Status code and error category for the response body.
    pub fn status_and_category(&self) -> (StatusCode, &'static str) {
        use gastro_core::Error;
        match self {
            ApiError::Core(e) => match e {
                Error::Validation { .. } => (StatusCode::BAD_REQUEST, "validation"),
                Error::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                Error::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
                Error::Procedure { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "procedure"),
                Error::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
                Error::Backend { .. } => (StatusCode::BAD_GATEWAY, "backend"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "authentication"),
            ApiError::Body(_) | ApiError::Path(_) | ApiError::Query(_) => {
                (StatusCode::BAD_REQUEST, "request")
            }
        }
    }

    fn field(&self) -> Option<&str> {
        match self {
            ApiError::Core(gastro_core::Error::Validation { field, .. }) => field.as_deref(),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, category) = self.status_and_category();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        let mut error = json!({
            "category": category,
            "message": self.to_string(),
        });
        if let Some(field) = self.field() {
            error["field"] = json!(field);
        }
        (status, Json(json!({ "error": error }))).into_response()
    }
}
