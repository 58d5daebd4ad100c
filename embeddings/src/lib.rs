//! # Embeddings
//!
//! Vector representations and similarity search for the CDP support
//! assistant.
//!
//! ## Features
//!
//! - **TF-IDF Model**: A bag-of-words vector space fit once over a fixed corpus
//! - **Similarity Search**: Cosine similarity, top-k ranking and a filtered index
//! - **Multiple Providers**: OpenAI embeddings over HTTP or the local TF-IDF model
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► SimilarityIndex           │
//! │       │                    ▲              │                     │
//! │       ▼                    │              ▼                     │
//! │  OpenAI / TF-IDF      TfidfModel     cosine top-k              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod index;
pub mod provider;
pub mod similarity;
pub mod tfidf;

pub use error::{EmbeddingError, Result};
pub use index::{IndexEntry, SimilarityIndex};
pub use provider::{
    DEFAULT_BATCH_SIZE, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, OpenAIProvider,
    TfidfProvider,
};
pub use similarity::{SimilarityResult, cosine_similarity, find_top_k, max_similarity, normalize};
pub use tfidf::{ENGLISH_STOP_WORDS, TfidfModel};

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings produced by the default OpenAI model.
pub const DEFAULT_DIMENSION: usize = 1536; // OpenAI text-embedding-3-small
