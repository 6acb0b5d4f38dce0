//! Error types for the relay gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Error types for generation calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("upstream overloaded: {0}")]
    Overloaded(String),

    #[error("upstream call failed: {0}")]
    UpstreamFailed(String),

    #[error("upstream communication error: {0}")]
    Communication(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            // Caller mistakes get a short plain-text reason and no envelope.
            Error::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            // Pre-stream upstream failures carry a JSON error body. The
            // transient classes keep their distinguishing status code so
            // clients classify by status alone, not message text.
            Error::RateLimited(_) => error_json(StatusCode::TOO_MANY_REQUESTS, &self),
            Error::Overloaded(_) => error_json(StatusCode::SERVICE_UNAVAILABLE, &self),
            Error::UpstreamFailed(_) | Error::Communication(_) => {
                error_json(StatusCode::BAD_GATEWAY, &self)
            }
            Error::Internal(_) => error_json(StatusCode::INTERNAL_SERVER_ERROR, &self),
        }
    }
}

fn error_json(status: StatusCode, error: &Error) -> Response {
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

pub type Result<T> = std::result::Result<T, Error>;
