//! Per-kind retrieval fan-out.

use std::sync::Arc;

use tracing::debug;

use crate::classifier::Classification;
use crate::config::RetrievalConfig;
use crate::document::{Document, DocumentStore, SearchRequest};
use crate::error::Result;

/// Turns a classification into similarity searches against the store.
///
/// | kind       | calls            | filter           | k              |
/// |------------|------------------|------------------|----------------|
/// | how-to     | 1                | the product      | `top_k`        |
/// | comparison | one per product  | each product     | `comparison_k` |
/// | ambiguous  | 1                | none             | `top_k`        |
/// | unrelated  | 0                |                  |                |
///
/// Comparison results are concatenated in product-list order without
/// re-ranking. Searches run one after another; the first store failure is
/// returned as is.
#[derive(Clone)]
pub struct RetrievalStrategy {
    store: Arc<dyn DocumentStore>,
    top_k: usize,
    comparison_k: usize,
}

impl RetrievalStrategy {
    pub fn new(store: Arc<dyn DocumentStore>, config: &RetrievalConfig) -> Self {
        Self {
            store,
            top_k: config.top_k,
            comparison_k: config.comparison_k,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn retrieve(&self, classification: &Classification) -> Result<Vec<Document>> {
        match classification {
            Classification::HowTo {
                question, product, ..
            } => {
                self.store
                    .similarity_search(SearchRequest::new(question, self.top_k).for_product(product))
                    .await
            }
            Classification::Comparison { question, products } => {
                let mut documents = Vec::new();
                for product in products {
                    let found = self
                        .store
                        .similarity_search(
                            SearchRequest::new(question, self.comparison_k).for_product(product),
                        )
                        .await?;
                    debug!("Comparison search for {product}: {} passages", found.len());
                    documents.extend(found);
                }
                Ok(documents)
            }
            Classification::Ambiguous { question } => {
                self.store
                    .similarity_search(SearchRequest::new(question, self.top_k))
                    .await
            }
            Classification::Unrelated { .. } => Ok(Vec::new()),
        }
    }
}
