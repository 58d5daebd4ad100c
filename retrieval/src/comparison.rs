//! Feature-level comparison data.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{FeatureCategory, ProductCatalog};
use crate::document::{Document, DocumentStore, SearchRequest};
use crate::error::Result;

/// Feature category a question is most about, if any.
///
/// Each category scores the number of its keywords found in the lowercased
/// question. The first category to reach the highest score wins; all-zero
/// scores mean no feature.
pub fn extract_feature(question: &str) -> Option<FeatureCategory> {
    let lowered = question.to_lowercase();
    let mut best: Option<(FeatureCategory, usize)> = None;

    for feature in FeatureCategory::ALL {
        let score = feature
            .keywords()
            .iter()
            .filter(|keyword| lowered.contains(*keyword))
            .count();
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((feature, score));
        }
    }

    best.map(|(feature, _)| feature)
}

/// What a comparison answer knows about one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProductComparison {
    /// A feature was identified: the static description plus a few
    /// supplementary passages.
    Feature {
        product: String,
        feature: FeatureCategory,
        summary: Option<String>,
        documents: Vec<Document>,
    },
    /// No feature identified: passages retrieved for the question itself.
    General {
        product: String,
        documents: Vec<Document>,
    },
}

impl ProductComparison {
    pub fn product(&self) -> &str {
        match self {
            ProductComparison::Feature { product, .. }
            | ProductComparison::General { product, .. } => product,
        }
    }

    pub fn documents(&self) -> &[Document] {
        match self {
            ProductComparison::Feature { documents, .. }
            | ProductComparison::General { documents, .. } => documents,
        }
    }
}

/// Per-product comparison data, in the order products were requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonData {
    pub feature: Option<FeatureCategory>,
    pub products: Vec<ProductComparison>,
}

/// Builds [`ComparisonData`] with one store call per product.
#[derive(Clone)]
pub struct ComparisonEngine {
    catalog: Arc<ProductCatalog>,
    store: Arc<dyn DocumentStore>,
    feature_k: usize,
    general_k: usize,
}

impl ComparisonEngine {
    pub fn new(
        catalog: Arc<ProductCatalog>,
        store: Arc<dyn DocumentStore>,
        feature_k: usize,
        general_k: usize,
    ) -> Self {
        Self {
            catalog,
            store,
            feature_k,
            general_k,
        }
    }

    pub async fn comparison_data(
        &self,
        question: &str,
        products: &[String],
    ) -> Result<ComparisonData> {
        let feature = extract_feature(question);
        debug!("Comparison feature: {feature:?}");

        let mut entries = Vec::with_capacity(products.len());
        for product in products {
            let entry = match feature {
                Some(feature) => {
                    let query = format!("{feature} in {product}");
                    let documents = self
                        .store
                        .similarity_search(
                            SearchRequest::new(query, self.feature_k).for_product(product),
                        )
                        .await?;
                    ProductComparison::Feature {
                        product: product.clone(),
                        feature,
                        summary: self
                            .catalog
                            .feature_summary(product, feature)
                            .map(str::to_string),
                        documents,
                    }
                }
                None => {
                    let documents = self
                        .store
                        .similarity_search(
                            SearchRequest::new(question, self.general_k).for_product(product),
                        )
                        .await?;
                    ProductComparison::General {
                        product: product.clone(),
                        documents,
                    }
                }
            };
            entries.push(entry);
        }

        Ok(ComparisonData {
            feature,
            products: entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_feature() {
        assert_eq!(
            extract_feature("Which CDP has better privacy compliance: Segment or mParticle?"),
            Some(FeatureCategory::PrivacyCompliance)
        );
        assert_eq!(
            extract_feature("How do their destinations and integrations differ?"),
            Some(FeatureCategory::Integrations)
        );
        assert_eq!(extract_feature("Which one is cheaper?"), None);
        assert_eq!(extract_feature(""), None);
    }

    #[test]
    fn test_first_category_wins_a_tie() {
        // One audience keyword and one privacy keyword.
        assert_eq!(
            extract_feature("audience consent"),
            Some(FeatureCategory::AudienceCreation)
        );
        // One data-collection keyword and one user-profile keyword.
        assert_eq!(
            extract_feature("capture identity"),
            Some(FeatureCategory::DataCollection)
        );
    }

    #[test]
    fn test_higher_count_beats_scan_order() {
        // audience: 1, privacy: 2
        assert_eq!(
            extract_feature("audience gdpr consent"),
            Some(FeatureCategory::PrivacyCompliance)
        );
    }

    #[test]
    fn test_connect_weighs_double() {
        // audience: 1 ("segment"), integrations: 2, privacy: 2
        assert_eq!(
            extract_feature("How do Segment and Lytics connect to tools, and handle gdpr consent?"),
            Some(FeatureCategory::Integrations)
        );
        assert_eq!(
            extract_feature("Can I connect it to a consent tool?"),
            Some(FeatureCategory::Integrations)
        );
    }
}
