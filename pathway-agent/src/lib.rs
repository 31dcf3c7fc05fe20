//! Pathway Agent - retrieval-grounded pathway generation
//!
//! Provides the pipelines that turn a brief into a learning pathway:
//! - Trait-based completion backends (OpenAI-compatible, mock)
//! - Context retrieval over embeddings, a vector index and video search
//! - Full generation, single-item regeneration and brief drafting
//! - Video link reconciliation against the retrieved candidates
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            PathwayService               │
//! │  (generate / regenerate / draft)        │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌──────────────────┐
//! │ LlmBackend  │       │ ContextRetriever │
//! │ (OpenAI/    │       │ (embed → vector  │
//! │  mock)      │       │  + video search) │
//! └─────────────┘       └──────────────────┘
//! ```

pub mod backend;
pub mod config;
pub mod details;
pub mod error;
pub mod generation;
pub mod regeneration;
pub mod request;
pub mod response;
pub mod retrieval;
pub mod service;
pub mod stage;

// Re-export main types for convenience
pub use backend::traits::{CompletionRequest, CompletionResponse, LlmBackend, LlmError};
pub use config::{CallSiteConfig, CompletionConfig, PipelineConfig};
pub use details::DetailsDrafter;
pub use error::{ErrorBody, PipelineError};
pub use generation::GenerationOrchestrator;
pub use regeneration::RegenerationOrchestrator;
pub use request::{GenerationRequest, RegenerationRequest};
pub use response::{PathwayDetails, RegeneratedItem, RegenerationResponse};
pub use retrieval::{ContextRetriever, RetrievalError, RetrievedContext};
pub use service::{PathwayService, PipelineOutput};
