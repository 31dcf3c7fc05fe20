//! PathwayService - main entry point for pipeline invocation.
//!
//! Wires one completion backend and one retriever into the generation,
//! regeneration and drafting pipelines.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use curriculum::{Pathway, PathwayBrief};

use crate::backend::LlmBackend;
use crate::config::PipelineConfig;
use crate::details::DetailsDrafter;
use crate::error::PipelineError;
use crate::generation::GenerationOrchestrator;
use crate::regeneration::RegenerationOrchestrator;
use crate::request::{GenerationRequest, RegenerationRequest};
use crate::response::{PathwayDetails, RegenerationResponse};
use crate::retrieval::ContextRetriever;

/// Output of [`PathwayService::handle`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PipelineOutput {
    Pathway(Pathway),
    Regeneration(RegenerationResponse),
}

/// Main entry point for pathway pipelines.
///
/// Cheap to clone; all clones share the same backends.
#[derive(Clone)]
pub struct PathwayService {
    backend: Arc<dyn LlmBackend>,
    config: Arc<PipelineConfig>,
    generation: GenerationOrchestrator,
    regeneration: RegenerationOrchestrator,
    details: DetailsDrafter,
}

impl PathwayService {
    /// Create a service with the given backend, retriever and config.
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        retriever: ContextRetriever,
        config: PipelineConfig,
    ) -> Self {
        let config = Arc::new(config);
        let retriever = retriever.with_max_videos(config.max_videos);

        info!(
            model = backend.id(),
            rule_set = config.rule_set.as_str(),
            generation_top_k = config.generation.top_k,
            regeneration_top_k = config.regeneration.top_k,
            "Initializing PathwayService"
        );

        Self {
            generation: GenerationOrchestrator::new(
                backend.clone(),
                retriever.clone(),
                config.clone(),
            ),
            regeneration: RegenerationOrchestrator::new(backend.clone(), retriever, config.clone()),
            details: DetailsDrafter::new(backend.clone(), config.clone()),
            backend,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Generate a complete pathway.
    pub async fn generate(&self, brief: &PathwayBrief) -> Result<Pathway, PipelineError> {
        self.generation.generate(brief).await
    }

    /// Replace one step or activity.
    pub async fn regenerate(
        &self,
        request: &RegenerationRequest,
    ) -> Result<RegenerationResponse, PipelineError> {
        self.regeneration.regenerate(request).await
    }

    /// Draft a brief from a free-text idea.
    pub async fn draft_details(&self, prompt: &str) -> Result<PathwayDetails, PipelineError> {
        self.details.draft(prompt).await
    }

    /// Dispatch any request to its pipeline.
    pub async fn handle(&self, request: &GenerationRequest) -> Result<PipelineOutput, PipelineError> {
        match request {
            GenerationRequest::Full(brief) => self.generate(brief).await.map(PipelineOutput::Pathway),
            GenerationRequest::Partial(request) => self
                .regenerate(request)
                .await
                .map(PipelineOutput::Regeneration),
        }
    }

    /// Whether the completion backend answers.
    pub async fn is_ready(&self) -> bool {
        self.backend.is_available().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::retrieval::{MockEmbedder, MockVectorIndex, MockVideoSearch};

    fn service(backend: Arc<MockBackend>) -> PathwayService {
        PathwayService::new(
            backend,
            ContextRetriever::new(
                Arc::new(MockEmbedder::default()),
                Arc::new(MockVectorIndex::default()),
                Arc::new(MockVideoSearch::default()),
            ),
            PipelineConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_readiness_follows_backend() {
        assert!(service(Arc::new(MockBackend::default())).is_ready().await);
        assert!(
            !service(Arc::new(MockBackend::default().with_available(false)))
                .is_ready()
                .await
        );
    }

    #[tokio::test]
    async fn test_handle_dispatches_by_variant() {
        let backend = Arc::new(MockBackend::default());
        let service = service(backend.clone());

        let error = service
            .handle(&GenerationRequest::Full(PathwayBrief::default()))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), "MissingParameters");

        let error = service
            .handle(&GenerationRequest::Partial(RegenerationRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), "MissingParameters");
        assert_eq!(backend.call_count(), 0);
    }
}
