//! YouTube Data API video search.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use curriculum::VideoReference;

use super::traits::{RetrievalError, VideoSearch};

/// Default YouTube Data API v3 base URL.
pub const YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

const SERVICE: &str = "video search";

/// Keyword video search through `GET {base}/search`.
pub struct YouTubeSearch {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

#[derive(Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

impl YouTubeSearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: YOUTUBE_API_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Share a pooled HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl VideoSearch for YouTubeSearch {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<VideoReference>, RetrievalError> {
        let max_results = max_results.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("q", query),
                ("key", self.api_key.as_str()),
            ])
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

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::ParseError(e.to_string()))?;

        Ok(parsed
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(VideoReference::new(
                    item.snippet.title,
                    watch_url(&video_id),
                    item.snippet.description,
                ))
            })
            .collect())
    }
}
