//! Documentation passages and the similarity-search seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Where a passage came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Product id the passage documents.
    pub product: String,

    /// Base name of the file the passage was cut from.
    pub source: String,
}

/// One retrievable documentation passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(
        text: impl Into<String>,
        product: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            metadata: DocumentMetadata {
                product: product.into(),
                source: source.into(),
            },
        }
    }

    pub fn product(&self) -> &str {
        &self.metadata.product
    }
}

/// A similarity search, optionally restricted to one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub k: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
}

impl SearchRequest {
    /// Unfiltered search for the `k` closest passages.
    pub fn new(query: impl Into<String>, k: usize) -> Self {
        Self {
            query: query.into(),
            k,
            product: None,
        }
    }

    /// Restrict the search to passages tagged with `product`.
    pub fn for_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }
}

/// Similarity search over documentation passages.
///
/// Implementations return at most `k` documents, closest first. No matches
/// is an empty vector; an error always means the store itself failed and is
/// reported as [`crate::RetrievalError::Unavailable`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn similarity_search(&self, request: SearchRequest) -> Result<Vec<Document>>;
}
