//! Resolving which product a question is about.

use std::sync::Arc;

use cdp_embeddings::{ENGLISH_STOP_WORDS, Embedding, TfidfModel, max_similarity};
use tracing::{debug, info};

use crate::catalog::ProductCatalog;
use crate::error::{Result, RetrievalError};

/// Similarity a question must exceed before it is attributed to a product.
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.3;

/// Best similarity-based guess for a question.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductScore {
    pub product: String,
    pub score: f32,
}

/// Identifies the product a question concerns.
///
/// An explicit mention of a product id wins outright (first in catalog
/// order). Otherwise the question is compared with every product's sample
/// questions under a TF-IDF model fit over all samples. English function
/// words are left out of that model so phrasing like "how do I" carries no
/// weight. The product with the highest per-product maximum is returned if
/// that maximum exceeds the threshold.
pub struct CdpIdentifier {
    catalog: Arc<ProductCatalog>,
    model: TfidfModel,
    /// Sample vectors per product, in catalog order.
    sample_vectors: Vec<(String, Vec<Embedding>)>,
    min_similarity: f32,
}

impl CdpIdentifier {
    /// Fit the similarity model over the catalog's sample questions.
    ///
    /// Fails with a configuration error if there are no samples to fit on.
    pub fn new(catalog: Arc<ProductCatalog>, min_similarity: f32) -> Result<Self> {
        if catalog.sample_count() == 0 {
            return Err(RetrievalError::Config(
                "sample question corpus is empty".to_string(),
            ));
        }

        let samples = catalog
            .products()
            .iter()
            .flat_map(|p| p.samples.iter().map(String::as_str));
        let model = TfidfModel::fit_with_stop_words(samples, ENGLISH_STOP_WORDS)
            .map_err(|e| RetrievalError::Config(format!("similarity model: {e}")))?;

        let sample_vectors = catalog
            .products()
            .iter()
            .map(|p| {
                let vectors = p.samples.iter().map(|s| model.transform(s)).collect();
                (p.id.clone(), vectors)
            })
            .collect();

        info!(
            "Fit product identifier over {} samples ({} terms)",
            model.documents(),
            model.dimension()
        );

        Ok(Self {
            catalog,
            model,
            sample_vectors,
            min_similarity,
        })
    }

    /// Product the question concerns, if any.
    pub fn identify(&self, question: &str) -> Option<String> {
        let lowered = question.to_lowercase();
        if let Some(product) = self.catalog.first_mentioned(&lowered) {
            return Some(product.id.clone());
        }

        let best = self.best_match(question)?;
        if best.score > self.min_similarity {
            debug!(
                "Identified {} by similarity {:.3}",
                best.product, best.score
            );
            Some(best.product)
        } else {
            debug!(
                "Best similarity {:.3} ({}) is below threshold {}",
                best.score, best.product, self.min_similarity
            );
            None
        }
    }

    /// Product with the highest sample similarity, regardless of threshold.
    ///
    /// Scores are the maximum over each product's samples; the overall
    /// winner is the maximum over products, first in catalog order on ties.
    pub fn best_match(&self, question: &str) -> Option<ProductScore> {
        let query = self.model.transform(question);
        let mut best: Option<ProductScore> = None;

        for (product, vectors) in &self.sample_vectors {
            let score = match max_similarity(&query, vectors.iter().map(Vec::as_slice)) {
                Ok(Some(score)) => score,
                // Dimensions always agree within one model; empty sample
                // lists simply do not compete.
                Ok(None) | Err(_) => continue,
            };
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(ProductScore {
                    product: product.clone(),
                    score,
                });
            }
        }

        best
    }

    pub fn min_similarity(&self) -> f32 {
        self.min_similarity
    }
}
