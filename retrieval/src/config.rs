//! Configuration for routing and retrieval.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};
use crate::identifier::DEFAULT_MIN_SIMILARITY;

/// Tunables for question routing and retrieval fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages fetched for how-to and ambiguous questions.
    pub top_k: usize,

    /// Passages fetched per product for comparison questions.
    pub comparison_k: usize,

    /// Supplementary passages per product when a comparison names a feature.
    pub feature_k: usize,

    /// Similarity a question must exceed to be attributed to a product.
    pub min_similarity: f32,

    /// Refine how-to questions into advanced sub-kinds.
    pub advanced_enabled: bool,

    /// Attach static feature descriptions to comparison answers.
    pub feature_snippets: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            comparison_k: 3,
            feature_k: 2,
            min_similarity: DEFAULT_MIN_SIMILARITY,
            advanced_enabled: true,
            feature_snippets: true,
        }
    }
}

impl RetrievalConfig {
    /// Parse a configuration from TOML; missing keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 || self.comparison_k == 0 {
            return Err(RetrievalError::Config(
                "top_k and comparison_k must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.min_similarity) {
            return Err(RetrievalError::Config(format!(
                "min_similarity must be in [0, 1), got {}",
                self.min_similarity
            )));
        }
        Ok(())
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn with_comparison_k(mut self, k: usize) -> Self {
        self.comparison_k = k;
        self
    }

    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    pub fn with_advanced(mut self, enabled: bool) -> Self {
        self.advanced_enabled = enabled;
        self
    }
}

/// How documentation files are cut into passages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum passage length in characters.
    pub chunk_size: usize,

    /// Characters shared between neighbouring passages.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(RetrievalError::Config(format!(
                "chunk_overlap ({}) must be smaller than a positive chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}
