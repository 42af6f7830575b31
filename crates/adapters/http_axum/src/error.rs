//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use webthing_domain::error::WebThingError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Everything a handler can fail with, mapped to a status code.
#[derive(Debug)]
pub enum ApiError {
    /// A thing operation was rejected.
    Thing(WebThingError),
    /// Nothing lives at the requested path.
    UnknownPath,
    /// The request body could not be understood.
    BadRequest(String),
    /// The resource exists but does not support the method.
    MethodNotAllowed,
}

impl From<WebThingError> for ApiError {
    fn from(err: WebThingError) -> Self {
        Self::Thing(err)
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Thing(WebThingError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Thing(WebThingError::NotFound(err)) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Thing(WebThingError::Forwarding(err)) => {
                tracing::error!(error = ?err, "device rejected value");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            Self::UnknownPath => (StatusCode::NOT_FOUND, "not found".to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "method not allowed".to_string(),
            ),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
