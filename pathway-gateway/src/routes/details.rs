//! POST /api/pathway-details - draft a brief from a free-text idea

use bytes::Bytes;
use hyper::{Response, StatusCode};
use serde::Deserialize;

use pathway_agent::PathwayService;

use super::{error_response, json_response, pipeline_error_response, FullBody};

#[derive(Debug, Default, Deserialize)]
pub struct DetailsRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

pub async fn handle_pathway_details(service: &PathwayService, body: &Bytes) -> Response<FullBody> {
    let request: DetailsRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "MissingParameters",
                format!("Invalid JSON body: {}", e),
            )
        }
    };

    let prompt = request.prompt.unwrap_or_default();
    match service.draft_details(&prompt).await {
        Ok(details) => json_response(StatusCode::OK, &details),
        Err(e) => pipeline_error_response(&e),
    }
}
