//! In-memory document store backed by a [`SimilarityIndex`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cdp_embeddings::{EmbeddingProvider, EmbeddingRequest, SimilarityIndex};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::document::{Document, DocumentStore, SearchRequest};
use crate::error::{Result, RetrievalError};

/// Lowest possible cosine score; searches never drop a candidate on score.
const NO_MIN_SCORE: f32 = -1.0;

struct StoreState {
    index: SimilarityIndex,
    documents: HashMap<String, Document>,
}

/// Holds passages and their embeddings in process memory.
///
/// Queries are embedded with the same provider as the passages. Nothing is
/// persisted; the store is rebuilt from the documentation directory at
/// startup.
pub struct InMemoryDocumentStore {
    provider: Arc<dyn EmbeddingProvider>,
    state: RwLock<StoreState>,
}

impl InMemoryDocumentStore {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        let dimension = provider.default_dimension();
        Self {
            provider,
            state: RwLock::new(StoreState {
                index: SimilarityIndex::new(dimension),
                documents: HashMap::new(),
            }),
        }
    }

    /// Build a store and index `documents` into it.
    pub async fn from_documents(
        provider: Arc<dyn EmbeddingProvider>,
        documents: Vec<Document>,
    ) -> Result<Self> {
        let store = Self::new(provider);
        store.add_documents(documents).await?;
        Ok(store)
    }

    /// Embed and index `documents`. Returns how many were added.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<usize> {
        if documents.is_empty() {
            return Ok(0);
        }

        let requests = documents
            .iter()
            .map(|doc| EmbeddingRequest::new(doc.text.clone()))
            .collect();
        let embeddings = self.provider.embed_batch(requests).await?;

        let mut state = self.state.write().await;
        let count = documents.len();
        for (document, response) in documents.into_iter().zip(embeddings) {
            let id = format!("doc-{}", state.documents.len());
            state.index.add(id.clone(), response.embedding)?;
            state.documents.insert(id, document);
        }

        info!(
            "Indexed {count} passages with {} ({} total)",
            self.provider.name(),
            state.documents.len()
        );
        Ok(count)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn similarity_search(&self, request: SearchRequest) -> Result<Vec<Document>> {
        let product = request.product.as_deref();
        if request.k == 0 {
            return Ok(Vec::new());
        }

        let query = self
            .provider
            .embed(EmbeddingRequest::new(request.query.clone()))
            .await
            .map_err(|e| RetrievalError::unavailable(product, e.to_string()))?;

        let state = self.state.read().await;
        let hits = state
            .index
            .search_where(&query.embedding, request.k, NO_MIN_SCORE, |id| {
                product.is_none_or(|p| {
                    state
                        .documents
                        .get(id)
                        .is_some_and(|doc| doc.metadata.product == p)
                })
            })
            .map_err(|e| RetrievalError::unavailable(product, e.to_string()))?;

        debug!(
            "Search {:?} (product {:?}) matched {} passages",
            request.query,
            product,
            hits.len()
        );

        Ok(hits
            .into_iter()
            .filter_map(|hit| state.documents.get(&hit.id).cloned())
            .collect())
    }
}
