//! GET /api/pathway - full pathway generation
//!
//! The brief arrives as query parameters: `pathway_name`,
//! `pathway_overview`, `pathway_learning_outcomes`, `audience`, `rationale`.

use hyper::{Response, StatusCode};

use curriculum::PathwayBrief;
use pathway_agent::PathwayService;

use super::{error_response, json_response, pipeline_error_response, FullBody};

/// Parse the brief from a query string.
///
/// `name`, `overview` and `learningOutcomes` also accept their `pathway_`
/// query names; giving both spellings, or one twice, is a conflict.
pub fn parse_brief(query: Option<&str>) -> Result<PathwayBrief, String> {
    serde_urlencoded::from_str(query.unwrap_or("")).map_err(|e| {
        let message = e.to_string();
        match message.strip_prefix("duplicate field ") {
            Some(field) => format!(
                "Conflicting query parameters: {} was given more than once",
                field
            ),
            None => format!("Invalid query parameters: {}", message),
        }
    })
}

pub async fn handle_generate(service: &PathwayService, query: Option<&str>) -> Response<FullBody> {
    let brief = match parse_brief(query) {
        Ok(brief) => brief,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, "MissingParameters", e)
        }
    };

    match service.generate(&brief).await {
        Ok(pathway) => json_response(StatusCode::OK, &pathway),
        Err(e) => pipeline_error_response(&e),
    }
}
