//! Context retrieval: passages and candidate videos for one query.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use curriculum::{RetrievedPassage, VideoReference};

use super::traits::{Embedder, RetrievalError, VectorIndex, VideoSearch};

/// Everything retrieved for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    /// Ranked reference passages, best first
    pub passages: Vec<RetrievedPassage>,
    /// Candidate videos; the whitelist for link reconciliation
    pub videos: Vec<VideoReference>,
}

/// Embeds a query, then runs vector search and video search concurrently.
#[derive(Clone)]
pub struct ContextRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    videos: Arc<dyn VideoSearch>,
    max_videos: usize,
}

impl ContextRetriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        videos: Arc<dyn VideoSearch>,
    ) -> Self {
        Self {
            embedder,
            index,
            videos,
            max_videos: 5,
        }
    }

    /// Cap on candidate videos per request.
    pub fn with_max_videos(mut self, max_videos: usize) -> Self {
        self.max_videos = max_videos;
        self
    }

    /// Retrieve passages and candidate videos for `query`.
    ///
    /// Embedding and vector search failures are fatal. A video search
    /// failure is logged and yields an empty candidate set.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<RetrievedContext, RetrievalError> {
        let started = Instant::now();
        let vector = self.embedder.embed(query).await?;

        let (matches, videos) = tokio::join!(
            self.index.query(&vector, top_k),
            self.videos.search(query, self.max_videos),
        );

        let matches = matches?;
        let total_matches = matches.len();
        let passages: Vec<RetrievedPassage> = matches
            .into_iter()
            .filter_map(|hit| {
                let id = hit.id.clone();
                let passage = hit.into_passage();
                if passage.is_none() {
                    debug!(match_id = %id, "Skipping match without content");
                }
                passage
            })
            .collect();

        let videos = match videos {
            Ok(mut videos) => {
                videos.truncate(self.max_videos);
                videos
            }
            Err(e) => {
                warn!(error = %e, "Video search failed, continuing without candidates");
                Vec::new()
            }
        };

        debug!(
            top_k,
            matches = total_matches,
            passages = passages.len(),
            videos = videos.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Retrieved context"
        );

        Ok(RetrievedContext { passages, videos })
    }
}
