//! Mock retrieval services for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use curriculum::VideoReference;

use super::traits::*;

/// Returns a fixed vector for every input.
pub struct MockEmbedder {
    available: AtomicBool,
    dimensions: usize,
    call_count: AtomicU32,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            available: AtomicBool::new(true),
            dimensions,
            call_count: AtomicU32::new(0),
        }
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.available.store(available, Ordering::SeqCst);
        self
    }

    /// Get the number of times embed was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn id(&self) -> &str {
        "mock-embedding"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, RetrievalError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if !self.available.load(Ordering::SeqCst) {
            return Err(RetrievalError::Unavailable {
                service: "embedding",
                message: "Mock embedder disabled".to_string(),
            });
        }

        Ok(vec![0.1; self.dimensions])
    }
}

/// Returns configured matches, truncated to `top_k`.
#[derive(Default)]
pub struct MockVectorIndex {
    matches: Vec<VectorMatch>,
    unavailable: AtomicBool,
    call_count: AtomicU32,
    last_top_k: AtomicU32,
}

impl MockVectorIndex {
    pub fn new(matches: Vec<VectorMatch>) -> Self {
        Self {
            matches,
            ..Default::default()
        }
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.unavailable.store(!available, Ordering::SeqCst);
        self
    }

    /// Get the number of times query was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// The `top_k` of the most recent query.
    pub fn last_top_k(&self) -> u32 {
        self.last_top_k.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for MockVectorIndex {
    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<VectorMatch>, RetrievalError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.last_top_k.store(top_k as u32, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RetrievalError::Unavailable {
                service: "vector search",
                message: "Mock index disabled".to_string(),
            });
        }

        Ok(self.matches.iter().take(top_k).cloned().collect())
    }
}

/// Returns configured videos, truncated to `max_results`.
#[derive(Default)]
pub struct MockVideoSearch {
    videos: Vec<VideoReference>,
    unavailable: AtomicBool,
    call_count: AtomicU32,
}

impl MockVideoSearch {
    pub fn new(videos: Vec<VideoReference>) -> Self {
        Self {
            videos,
            ..Default::default()
        }
    }

    /// Set availability.
    pub fn with_available(self, available: bool) -> Self {
        self.unavailable.store(!available, Ordering::SeqCst);
        self
    }

    /// Get the number of times search was called.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoSearch for MockVideoSearch {
    async fn search(
        &self,
        _query: &str,
        max_results: usize,
    ) -> Result<Vec<VideoReference>, RetrievalError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RetrievalError::Unavailable {
                service: "video search",
                message: "Mock video search disabled".to_string(),
            });
        }

        Ok(self.videos.iter().take(max_results).cloned().collect())
    }
}
