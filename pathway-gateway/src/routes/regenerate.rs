//! POST /api/regenerate - replace one step or activity

use bytes::Bytes;
use hyper::{Response, StatusCode};

use pathway_agent::{PathwayService, RegenerationRequest};

use super::{error_response, json_response, pipeline_error_response, FullBody};

pub async fn handle_regenerate(service: &PathwayService, body: &Bytes) -> Response<FullBody> {
    let request: RegenerationRequest = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "MissingParameters",
                format!("Invalid JSON body: {}", e),
            )
        }
    };

    match service.regenerate(&request).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => pipeline_error_response(&e),
    }
}
