//! OpenAI-compatible embedding client.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{Embedder, RetrievalError};
use crate::backend::openai::OPENAI_BASE_URL;

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

const SERVICE: &str = "embedding";

/// Embeds text through `POST {base}/embeddings`.
pub struct OpenAiEmbedder {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
    encoding_format: &'static str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    /// Embedder for the OpenAI API with the default model.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new(OPENAI_BASE_URL, DEFAULT_EMBEDDING_MODEL, Some(api_key.into()))
    }

    /// Share a pooled HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn id(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let mut request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .json(&EmbedRequest {
                model: &self.model,
                input: text,
                encoding_format: "float",
            });

        if let Some(key) = &self.api_key {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RetrievalError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::RequestFailed {
                service: SERVICE,
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::ParseError(e.to_string()))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RetrievalError::ParseError("No embedding in response".to_string()))?;

        debug!(model = %self.model, dimensions = embedding.len(), "Embedded query");
        Ok(embedding)
    }
}
