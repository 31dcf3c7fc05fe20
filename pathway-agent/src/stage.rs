//! Pieces shared by every orchestrator: stages, deadlines and the forced
//! structured completion.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use curriculum::{GeneratedItem, OutputShape, PromptAssembler};

use crate::backend::{CompletionRequest, LlmBackend, ToolSpec};
use crate::config::CompletionConfig;
use crate::error::PipelineError;

/// Orchestrator states, in the order a request moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidatingInput,
    LocatingTarget,
    Retrieving,
    Prompting,
    Generating,
    ValidatingOutput,
    Reconciling,
    Splicing,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidatingInput => "validating_input",
            Self::LocatingTarget => "locating_target",
            Self::Retrieving => "retrieving",
            Self::Prompting => "prompting",
            Self::Generating => "generating",
            Self::ValidatingOutput => "validating_output",
            Self::Reconciling => "reconciling",
            Self::Splicing => "splicing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall-clock budget for one request.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            at: started + budget,
        }
    }

    /// Milliseconds since the request started.
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Run `fut` unless the deadline passes first.
    ///
    /// Expiry during retrieval is a retrieval failure; expiry anywhere else
    /// is a generation failure.
    pub async fn within<T, E, F>(&self, stage: Stage, fut: F) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<PipelineError>,
    {
        match tokio::time::timeout_at(self.at, fut).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => {
                let message = format!("request deadline exceeded while {}", stage);
                warn!(%stage, elapsed_ms = self.elapsed_ms(), "Request deadline exceeded");
                Err(match stage {
                    Stage::Retrieving => PipelineError::RetrievalFailed(message),
                    _ => PipelineError::GenerationFailed(message),
                })
            }
        }
    }
}

/// Log a stage transition.
pub(crate) fn enter(request_id: &str, stage: Stage) {
    debug!(request_id, %stage, "Entering stage");
}

/// Force one structured object of `shape` out of the backend and validate it.
pub(crate) async fn generate_structured(
    backend: &dyn LlmBackend,
    request_id: &str,
    prompt: String,
    shape: OutputShape,
    settings: &CompletionConfig,
    deadline: &Deadline,
) -> Result<GeneratedItem, PipelineError> {
    enter(request_id, Stage::Generating);
    debug!(
        request_id,
        model = backend.id(),
        function = shape.function_name(),
        prompt_digest = %PromptAssembler::digest(&prompt),
        prompt_tokens_est = PromptAssembler::estimate_tokens(&prompt),
        "Requesting structured completion"
    );

    let mut request = CompletionRequest::system(prompt).with_required_tool(ToolSpec::for_shape(shape));
    if let Some(temperature) = settings.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(max_tokens) = settings.max_completion_tokens {
        request = request.with_max_tokens(max_tokens);
    }

    let response = deadline
        .within(Stage::Generating, backend.complete(request))
        .await?;

    let structured = response.structured.ok_or_else(|| {
        PipelineError::GenerationFailed(format!(
            "model returned no {} call (finish reason {:?})",
            shape.function_name(),
            response.finish_reason
        ))
    })?;

    enter(request_id, Stage::ValidatingOutput);
    let item = shape.validate(&structured)?;
    warn_soft_targets(request_id, &item);
    Ok(item)
}

/// Log generated content that misses count targets or has an answer key
/// outside its options. Neither fails the request.
pub(crate) fn warn_soft_targets(request_id: &str, item: &GeneratedItem) {
    match item {
        GeneratedItem::Pathway(pathway) => {
            if !(5..=7).contains(&pathway.steps.len()) {
                warn!(request_id, steps = pathway.steps.len(), "Pathway step count outside 5-7");
            }
            for step in &pathway.steps {
                warn_activity_count(request_id, &step.name, step.activities.len());
            }
        }
        GeneratedItem::Step(step) => {
            warn_activity_count(request_id, &step.name, step.activities.len())
        }
        GeneratedItem::Activity(_) => {}
    }

    for activity in item.activities() {
        let inconsistent = activity
            .quiz
            .iter()
            .flatten()
            .filter(|question| !question.has_consistent_answer_key())
            .count();
        if inconsistent > 0 {
            warn!(
                request_id,
                activity = %activity.name,
                questions = inconsistent,
                "Quiz answer key not a subset of options"
            );
        }
    }
}

fn warn_activity_count(request_id: &str, step: &str, count: usize) {
    if !(3..=4).contains(&count) {
        warn!(request_id, step, activities = count, "Step activity count outside 3-4");
    }
}
