//! Health check endpoints
//!
//! - /health - Liveness probe (is the gateway running?)
//! - /ready - Readiness probe (does the completion backend answer?)

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::server::AppState;

use super::{json_response, FullBody};

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    /// Operating mode
    pub mode: &'static str,
    #[serde(rename = "ruleSet")]
    pub rule_set: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

pub fn health_check(state: &AppState) -> Response<FullBody> {
    json_response(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            version: env!("CARGO_PKG_VERSION"),
            uptime: state.started.elapsed().as_secs(),
            mode: if state.gate.is_disabled() {
                "development"
            } else {
                "production"
            },
            rule_set: state.service.config().rule_set.as_str(),
        },
    )
}

pub async fn readiness_check(state: &AppState) -> Response<FullBody> {
    if state.service.is_ready().await {
        json_response(
            StatusCode::OK,
            &ReadinessResponse {
                ready: true,
                error: None,
            },
        )
    } else {
        json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &ReadinessResponse {
                ready: false,
                error: Some("Completion backend unavailable"),
            },
        )
    }
}
