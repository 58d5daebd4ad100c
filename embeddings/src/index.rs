//! Similarity index for embedding lookups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::similarity::{SimilarityResult, find_top_k, normalize};

/// An entry in the similarity index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Unique identifier.
    pub id: String,

    /// The embedding vector (normalized).
    pub embedding: Embedding,
}

/// An in-memory index of embeddings searched by cosine similarity.
///
/// Entries keep their insertion order, which is also the tie-break order
/// for equal scores.
pub struct SimilarityIndex {
    /// Stored entries, in insertion order.
    entries: Vec<IndexEntry>,

    /// Position of each id in `entries`.
    positions: HashMap<String, usize>,

    /// Expected dimension of embeddings.
    dimension: usize,
}

impl SimilarityIndex {
    /// Create a new similarity index.
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            dimension,
        }
    }

    /// Expected dimension of embeddings.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Add an embedding to the index, replacing any entry with the same id.
    pub fn add(&mut self, id: impl Into<String>, mut embedding: Embedding) -> Result<()> {
        let id = id.into();

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        normalize(&mut embedding);

        match self.positions.get(&id) {
            Some(&position) => self.entries[position].embedding = embedding,
            None => {
                self.positions.insert(id.clone(), self.entries.len());
                self.entries.push(IndexEntry {
                    id: id.clone(),
                    embedding,
                });
            }
        }
        debug!("Added embedding to index: {id}");

        Ok(())
    }

    /// Check if an ID exists in the index.
    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    /// Get the number of entries in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Search all entries.
    pub fn search(&self, query: &[f32], k: usize, min_score: f32) -> Result<Vec<SimilarityResult>> {
        self.search_where(query, k, min_score, |_| true)
    }

    /// Search only the entries whose id satisfies `keep`.
    pub fn search_where<F>(
        &self,
        query: &[f32],
        k: usize,
        min_score: f32,
        keep: F,
    ) -> Result<Vec<SimilarityResult>>
    where
        F: Fn(&str) -> bool,
    {
        if query.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let candidates = self
            .entries
            .iter()
            .filter(|entry| keep(&entry.id))
            .map(|entry| (entry.id.as_str(), entry.embedding.as_slice()));

        find_top_k(query, candidates, k, min_score)
    }
}
