//! HTTP routes for the pathway gateway

pub mod details;
pub mod health;
pub mod pathway;
pub mod regenerate;

pub use details::handle_pathway_details;
pub use health::{health_check, readiness_check};
pub use pathway::handle_generate;
pub use regenerate::handle_regenerate;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::warn;

use pathway_agent::{ErrorBody, PipelineError};

pub type FullBody = Full<Bytes>;

// =============================================================================
// Response Helpers
// =============================================================================

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    let mut response = Response::new(Full::new(Bytes::from(json)));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// `{kind, message}` error response.
pub fn error_response(status: StatusCode, kind: &str, message: impl Into<String>) -> Response<FullBody> {
    json_response(
        status,
        &ErrorBody {
            kind: kind.to_string(),
            message: message.into(),
        },
    )
}

/// Report a pipeline failure under its mapped status.
pub fn pipeline_error_response(error: &PipelineError) -> Response<FullBody> {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
    if error.is_client_error() {
        warn!(kind = error.kind(), error = %error, "Rejected pipeline request");
    } else {
        warn!(kind = error.kind(), error = %error, "Pipeline request failed");
    }
    json_response(status, &error.to_body())
}

/// CORS preflight response
pub fn preflight_response() -> Response<FullBody> {
    let mut response = Response::new(Full::new(Bytes::new()));
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Authorization, Content-Type"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}

/// Not found response
pub fn not_found_response(path: &str) -> Response<FullBody> {
    error_response(StatusCode::NOT_FOUND, "NotFound", format!("No route for {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_status() {
        let response = pipeline_error_response(&PipelineError::InvalidActivityIndex(
            "Invalid activity index 99".to_string(),
        ));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let response =
            pipeline_error_response(&PipelineError::GenerationFailed("timeout".to_string()));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
