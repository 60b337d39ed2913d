//! API error types and JSON error response formatting.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use moviehub_core::error::MovieHubError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "invalid_input", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - blank or malformed input.
    BadRequest(String),
    /// 404 Not Found - no catalog match, or unknown resource.
    NotFound(String),
    /// 502 Bad Gateway - an upstream service failed.
    BadGateway(String),
    /// 504 Gateway Timeout - an upstream service did not answer in time.
    GatewayTimeout(String),
    /// 500 Internal Server Error, tagged with the underlying error code.
    Internal { code: &'static str, message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "upstream_unavailable", msg),
            ApiError::GatewayTimeout(msg) => {
                (StatusCode::GATEWAY_TIMEOUT, "upstream_timeout", msg)
            }
            ApiError::Internal { code, message } => {
                (StatusCode::INTERNAL_SERVER_ERROR, code, message)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<MovieHubError> for ApiError {
    fn from(err: MovieHubError) -> Self {
        match err {
            MovieHubError::InvalidInput(msg) => ApiError::BadRequest(msg),
            MovieHubError::NotFound(title) => {
                ApiError::NotFound(format!("no catalog match for '{}'", title))
            }
            MovieHubError::UpstreamTimeout(msg) => ApiError::GatewayTimeout(msg),
            MovieHubError::UpstreamUnavailable(msg) => ApiError::BadGateway(msg),
            other => {
                tracing::error!(error = %other, "Request failed");
                ApiError::Internal {
                    code: other.code(),
                    message: other.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn status_of(err: MovieHubError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_of(MovieHubError::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(MovieHubError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(MovieHubError::UpstreamTimeout("x".into())),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(MovieHubError::UpstreamUnavailable("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(MovieHubError::TemplateMissing(PathBuf::from("t.html"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_has_code_and_message_only() {
        let resp = ApiError::from(MovieHubError::NotFound("Nope".into())).into_response();
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "error": "not_found",
                "message": "no catalog match for 'Nope'"
            })
        );
    }

    #[test]
    fn test_internal_keeps_error_code() {
        match ApiError::from(MovieHubError::TemplateMissing(PathBuf::from("t.html"))) {
            ApiError::Internal { code, .. } => assert_eq!(code, "template_missing"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
