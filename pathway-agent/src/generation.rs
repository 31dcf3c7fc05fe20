//! Full pathway generation.

use std::sync::Arc;

use tracing::{info, warn};

use curriculum::{
    GeneratedItem, Pathway, PathwayBrief, PathwayMetadata, PromptAssembler, PromptBrief,
    UrlReconciler,
};

use crate::backend::LlmBackend;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::retrieval::ContextRetriever;
use crate::stage::{enter, generate_structured, Deadline, Stage};

/// Generates a complete pathway from a five-field brief.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    backend: Arc<dyn LlmBackend>,
    retriever: ContextRetriever,
    assembler: PromptAssembler,
    config: Arc<PipelineConfig>,
}

impl GenerationOrchestrator {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        retriever: ContextRetriever,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            backend,
            retriever,
            assembler: PromptAssembler::new(config.rule_set),
            config,
        }
    }

    /// Run one generation.
    ///
    /// The returned pathway takes its name and description from the brief
    /// and records every passage source and video candidate in `metadata`.
    pub async fn generate(&self, brief: &PathwayBrief) -> Result<Pathway, PipelineError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let deadline = Deadline::after(self.config.request_timeout());

        enter(&request_id, Stage::ValidatingInput);
        let missing = brief.missing_fields();
        if !missing.is_empty() {
            return Err(PipelineError::MissingParameters(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )));
        }

        enter(&request_id, Stage::Retrieving);
        let query = format!("{} {}", brief.name, brief.overview);
        let context = deadline
            .within(
                Stage::Retrieving,
                self.retriever.retrieve(&query, self.config.generation.top_k),
            )
            .await?;

        enter(&request_id, Stage::Prompting);
        let prompt = self.assembler.build_prompt(
            &PromptBrief::Pathway(brief),
            &context.passages,
            &context.videos,
        );

        let item = generate_structured(
            self.backend.as_ref(),
            &request_id,
            prompt,
            PromptBrief::Pathway(brief).shape(),
            &self.config.generation.completion,
            &deadline,
        )
        .await?;
        let generated = match item {
            GeneratedItem::Pathway(pathway) => pathway,
            other => {
                return Err(PipelineError::GenerationFailed(format!(
                    "expected a pathway, got a {:?}",
                    other.shape()
                )))
            }
        };

        enter(&request_id, Stage::Reconciling);
        let (generated, summary) = UrlReconciler::new(&context.videos).reconcile_pathway(generated);
        if summary.repaired_any() {
            warn!(
                request_id = %request_id,
                dropped = summary.dropped,
                fallbacks = summary.fallbacks,
                "Replaced video URLs outside the candidate set"
            );
        }

        let pathway = Pathway {
            name: brief.name.clone(),
            description: brief.overview.clone(),
            steps: generated.steps,
            metadata: Some(PathwayMetadata {
                sources: context
                    .passages
                    .into_iter()
                    .map(|passage| passage.metadata)
                    .collect(),
                videos: context.videos,
            }),
        };

        enter(&request_id, Stage::Done);
        info!(
            request_id = %request_id,
            steps = pathway.steps.len(),
            activities = summary.activities,
            videos_kept = summary.kept,
            videos_dropped = summary.dropped,
            elapsed_ms = deadline.elapsed_ms(),
            "Generated pathway"
        );

        Ok(pathway)
    }
}
