//! Drafting a generation brief from a free-text idea.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use curriculum::SchemaViolation;

use crate::backend::{CompletionRequest, LlmBackend, Message, ToolSpec};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::response::PathwayDetails;
use crate::stage::{enter, Deadline, Stage};

const SYSTEM_PROMPT: &str =
    "You are an assistant that helps create educational pathway details from natural language prompts.";

const FUNCTION_NAME: &str = "generate_pathway_details";

const FIELDS: [(&str, &str); 5] = [
    ("title", "A concise, engaging title for the pathway"),
    ("description", "A comprehensive overview of what the pathway covers"),
    (
        "learningOutcomes",
        "Specific skills or knowledge learners will gain from completing the pathway",
    ),
    (
        "targetAudience",
        "Description of who would benefit most from taking this pathway",
    ),
    ("whyTakeIt", "Compelling reasons why someone should take this pathway"),
];

/// Function declaration for the drafted brief.
pub fn details_tool() -> ToolSpec {
    let properties: serde_json::Map<String, Value> = FIELDS
        .iter()
        .map(|(name, description)| {
            (
                name.to_string(),
                json!({"type": "string", "description": description}),
            )
        })
        .collect();
    let required: Vec<&str> = FIELDS.iter().map(|(name, _)| *name).collect();

    ToolSpec::new(
        FUNCTION_NAME,
        "Generate detailed information for a pathway based on a prompt",
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
    )
}

/// Validate a raw `generate_pathway_details` result.
pub fn parse_details(value: &Value) -> Result<PathwayDetails, SchemaViolation> {
    let object = value.as_object().ok_or_else(|| SchemaViolation::NotAnObject {
        path: "$".to_string(),
    })?;

    let field = |name: &str| -> Result<String, SchemaViolation> {
        match object.get(name) {
            None | Some(Value::Null) => Err(SchemaViolation::MissingField {
                path: name.to_string(),
            }),
            Some(Value::String(s)) if s.trim().is_empty() => Err(SchemaViolation::BlankField {
                path: name.to_string(),
            }),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(SchemaViolation::WrongType {
                path: name.to_string(),
                expected: "a string",
            }),
        }
    };

    Ok(PathwayDetails {
        title: field("title")?,
        description: field("description")?,
        learning_outcomes: field("learningOutcomes")?,
        target_audience: field("targetAudience")?,
        why_take_it: field("whyTakeIt")?,
    })
}

/// Drafts the five brief fields from one prompt.
#[derive(Clone)]
pub struct DetailsDrafter {
    backend: Arc<dyn LlmBackend>,
    config: Arc<PipelineConfig>,
}

impl DetailsDrafter {
    pub fn new(backend: Arc<dyn LlmBackend>, config: Arc<PipelineConfig>) -> Self {
        Self { backend, config }
    }

    pub async fn draft(&self, prompt: &str) -> Result<PathwayDetails, PipelineError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let deadline = Deadline::after(self.config.request_timeout());

        enter(&request_id, Stage::ValidatingInput);
        if prompt.trim().is_empty() {
            return Err(PipelineError::MissingParameters(
                "Prompt is required".to_string(),
            ));
        }

        enter(&request_id, Stage::Generating);
        let mut request = CompletionRequest::system(SYSTEM_PROMPT)
            .with_message(Message::user(prompt))
            .with_required_tool(details_tool());
        if let Some(temperature) = self.config.details.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.config.details.max_completion_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = deadline
            .within(Stage::Generating, self.backend.complete(request))
            .await?;
        let structured = response.structured.ok_or_else(|| {
            PipelineError::GenerationFailed("Failed to generate pathway details".to_string())
        })?;

        enter(&request_id, Stage::ValidatingOutput);
        let details = parse_details(&structured)?;

        enter(&request_id, Stage::Done);
        info!(
            request_id = %request_id,
            title = %details.title,
            elapsed_ms = deadline.elapsed_ms(),
            "Drafted pathway details"
        );
        Ok(details)
    }
}
