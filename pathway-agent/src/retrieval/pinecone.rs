//! Pinecone data-plane query client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{RetrievalError, VectorIndex, VectorMatch};

const SERVICE: &str = "vector search";

/// Queries one Pinecone index through `POST {index_host}/query`.
pub struct PineconeIndex {
    client: Client,
    index_host: String,
    api_key: String,
    namespace: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

impl PineconeIndex {
    /// `index_host` may be given with or without a scheme.
    pub fn new(index_host: impl Into<String>, api_key: impl Into<String>) -> Self {
        let host = index_host.into();
        let host = host.trim_end_matches('/');
        let index_host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        Self {
            client: Client::new(),
            index_host,
            api_key: api_key.into(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Share a pooled HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.index_host)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>, RetrievalError> {
        let response = self
            .client
            .post(self.query_url())
            .header("Api-Key", &self.api_key)
            .json(&QueryRequest {
                vector,
                top_k,
                include_metadata: true,
                include_values: false,
                namespace: self.namespace.as_deref(),
            })
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

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::ParseError(e.to_string()))?;

        Ok(parsed.matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_host_normalised() {
        let index = PineconeIndex::new("pathways-abc123.svc.pinecone.io/", "key");
        assert_eq!(
            index.query_url(),
            "https://pathways-abc123.svc.pinecone.io/query"
        );

        let index = PineconeIndex::new("http://localhost:5081", "key");
        assert_eq!(index.query_url(), "http://localhost:5081/query");
    }

    #[test]
    fn test_query_request_body() {
        let body = serde_json::to_value(QueryRequest {
            vector: &[0.5, 0.25],
            top_k: 20,
            include_metadata: true,
            include_values: false,
            namespace: None,
        })
        .unwrap();

        assert_eq!(body["topK"], 20);
        assert_eq!(body["includeMetadata"], true);
        assert!(body.get("namespace").is_none());
    }
}
