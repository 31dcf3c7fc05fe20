//! Pipeline error taxonomy.

use serde::{Deserialize, Serialize};

use curriculum::SchemaViolation;

use crate::backend::LlmError;
use crate::retrieval::RetrievalError;

/// Errors returned by the generation pipelines.
///
/// Every variant has a stable [`kind`](PipelineError::kind) string and an
/// HTTP status the gateway reports it under.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Required request fields are absent or blank
    #[error("{0}")]
    MissingParameters(String),

    /// Activity index does not address an activity in the step
    #[error("{0}")]
    InvalidActivityIndex(String),

    /// Item index does not address a step in the pathway
    #[error("{0}")]
    InvalidStepIndex(String),

    /// Embedding or vector search failed, or retrieval ran out of time
    #[error("Retrieval failed: {0}")]
    RetrievalFailed(String),

    /// Completion failed, produced no structured object, or ran out of time
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Structured object does not match the requested shape
    #[error("Generated output has an invalid shape: {0}")]
    InvalidGenerationShape(#[from] SchemaViolation),
}

impl PipelineError {
    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameters(_) => "MissingParameters",
            Self::InvalidActivityIndex(_) => "InvalidActivityIndex",
            Self::InvalidStepIndex(_) => "InvalidStepIndex",
            Self::RetrievalFailed(_) => "RetrievalFailed",
            Self::GenerationFailed(_) => "GenerationFailed",
            Self::InvalidGenerationShape(_) => "InvalidGenerationShape",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingParameters(_)
            | Self::InvalidActivityIndex(_)
            | Self::InvalidStepIndex(_) => 400,
            Self::RetrievalFailed(_)
            | Self::GenerationFailed(_)
            | Self::InvalidGenerationShape(_) => 502,
        }
    }

    /// Whether the caller sent a bad request.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Serializable `{kind, message}` body.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<RetrievalError> for PipelineError {
    fn from(e: RetrievalError) -> Self {
        Self::RetrievalFailed(e.to_string())
    }
}

impl From<LlmError> for PipelineError {
    fn from(e: LlmError) -> Self {
        Self::GenerationFailed(e.to_string())
    }
}

/// Error payload reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}
