//! Traits for the services a retrieval pass talks to.

use async_trait::async_trait;
use serde::Deserialize;

use curriculum::{PageRef, RetrievedPassage, VideoReference};

/// Error types for retrieval services.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Service is not available
    #[error("{service} unavailable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },

    /// Service answered with an error status
    #[error("{service} request failed: {message}")]
    RequestFailed {
        service: &'static str,
        message: String,
    },

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Parsing error
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Turns text into a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the embedding model.
    fn id(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError>;
}

/// Nearest-neighbour search over embedded reference passages.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` matches with metadata, best first.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>, RetrievalError>;
}

/// Keyword search for candidate videos.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<VideoReference>, RetrievalError>;
}

/// One nearest-neighbour hit.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VectorMatch {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub metadata: MatchMetadata,
}

/// Metadata stored alongside each indexed passage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatchMetadata {
    pub content: Option<String>,
    pub source_document: Option<String>,
    /// Document key written by older ingestion runs
    pub pdf_name: Option<String>,
    pub page_number: Option<serde_json::Value>,
}

impl VectorMatch {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        document: impl Into<String>,
        page: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            score: 0.0,
            metadata: MatchMetadata {
                content: Some(content.into()),
                source_document: Some(document.into()),
                pdf_name: None,
                page_number: Some(page),
            },
        }
    }

    /// Convert to a passage. Matches without text yield `None`.
    pub fn into_passage(self) -> Option<RetrievedPassage> {
        let MatchMetadata {
            content,
            source_document,
            pdf_name,
            page_number,
        } = self.metadata;

        let text = content.filter(|text| !text.trim().is_empty())?;
        let page = page_number
            .as_ref()
            .and_then(PageRef::from_json)
            .unwrap_or_else(|| PageRef::Text("unknown".to_string()));
        let document = source_document
            .or(pdf_name)
            .unwrap_or_else(|| "unknown document".to_string());

        Some(RetrievedPassage::new(text, document, page))
    }
}
