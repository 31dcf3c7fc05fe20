//! Retrieval of reference passages and candidate videos.
//!
//! - [`Embedder`]: OpenAI-compatible embeddings
//! - [`VectorIndex`]: Pinecone nearest-neighbour query
//! - [`VideoSearch`]: YouTube keyword search
//! - [`ContextRetriever`]: one retrieval pass over all three

pub mod embedding;
pub mod mock;
pub mod pinecone;
pub mod retriever;
pub mod traits;
pub mod youtube;

pub use embedding::OpenAiEmbedder;
pub use mock::{MockEmbedder, MockVectorIndex, MockVideoSearch};
pub use pinecone::PineconeIndex;
pub use retriever::{ContextRetriever, RetrievedContext};
pub use traits::{Embedder, MatchMetadata, RetrievalError, VectorIndex, VectorMatch, VideoSearch};
pub use youtube::YouTubeSearch;
