//! The classify-then-retrieve entry point.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::advanced::AdvancedRouter;
use crate::catalog::ProductCatalog;
use crate::classifier::{Classification, QuestionClassifier};
use crate::comparison::{ComparisonData, ComparisonEngine};
use crate::config::RetrievalConfig;
use crate::document::{Document, DocumentStore};
use crate::error::{Result, RetrievalError};
use crate::identifier::CdpIdentifier;
use crate::patterns::PatternSet;
use crate::strategy::RetrievalStrategy;

/// A classified question together with the passages retrieved for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedQuestion {
    pub classification: Classification,
    pub documents: Vec<Document>,
}

/// Classification without retrieval: the rule-based classifier plus the
/// optional advanced refinement of how-to questions.
pub struct QuestionRouter {
    classifier: QuestionClassifier,
    advanced: AdvancedRouter,
    advanced_enabled: bool,
}

impl QuestionRouter {
    pub fn advanced(&self) -> &AdvancedRouter {
        &self.advanced
    }

    /// Classify `question`, refining how-to questions into an advanced
    /// sub-kind when that is enabled.
    pub fn classify(&self, question: &str) -> Classification {
        let classification = self.classifier.classify(question);
        if !self.advanced_enabled {
            return classification;
        }

        match classification {
            Classification::HowTo {
                question, product, ..
            } => {
                let advanced = self.advanced.refine(&question, &product);
                if let Some(intent) = &advanced {
                    debug!("Advanced {} question for {product}", intent.kind);
                }
                Classification::HowTo {
                    question,
                    product,
                    advanced,
                }
            }
            other => other,
        }
    }
}

/// Routes questions about the catalog's products to their documentation.
///
/// All state is read-only after construction, so one assistant can serve
/// concurrent requests behind an `Arc`.
pub struct SupportAssistant {
    config: RetrievalConfig,
    catalog: Arc<ProductCatalog>,
    router: QuestionRouter,
    strategy: RetrievalStrategy,
    comparison: ComparisonEngine,
}

impl SupportAssistant {
    pub fn builder() -> SupportAssistantBuilder {
        SupportAssistantBuilder::new()
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<ProductCatalog> {
        &self.catalog
    }

    pub fn advanced(&self) -> &AdvancedRouter {
        self.router.advanced()
    }

    pub fn classify(&self, question: &str) -> Classification {
        self.router.classify(question)
    }

    /// Classify `question` and fetch its passages.
    ///
    /// Store failures are returned as errors, never as an empty result.
    pub async fn route(&self, question: &str) -> Result<RoutedQuestion> {
        let classification = self.classify(question);
        let documents = self.strategy.retrieve(&classification).await?;

        info!(
            "Routed question: type={} advanced={} products={:?} documents={}",
            classification.kind(),
            classification
                .advanced()
                .map_or("none", |intent| intent.kind.as_str()),
            classification.products(),
            documents.len()
        );

        Ok(RoutedQuestion {
            classification,
            documents,
        })
    }

    /// Feature-level comparison data for `products`, one store call each.
    pub async fn compare(&self, question: &str, products: &[String]) -> Result<ComparisonData> {
        self.comparison.comparison_data(question, products).await
    }
}

/// Builder for [`SupportAssistant`].
pub struct SupportAssistantBuilder {
    config: RetrievalConfig,
    catalog: Option<ProductCatalog>,
    patterns: Option<PatternSet>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl SupportAssistantBuilder {
    pub fn new() -> Self {
        Self {
            config: RetrievalConfig::default(),
            catalog: None,
            patterns: None,
            store: None,
        }
    }

    pub fn with_config(mut self, config: RetrievalConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom catalog instead of the four reference products.
    pub fn with_catalog(mut self, catalog: ProductCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_patterns(mut self, patterns: PatternSet) -> Self {
        self.patterns = Some(patterns);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build only the classification half; no store is needed.
    pub fn build_router(self) -> Result<QuestionRouter> {
        let (router, _, _) = self.router_parts()?;
        Ok(router)
    }

    /// Fit the identifier and wire everything together.
    ///
    /// Fails on invalid configuration, a missing store, or an empty sample
    /// corpus.
    pub fn build(mut self) -> Result<SupportAssistant> {
        let store = self
            .store
            .take()
            .ok_or_else(|| RetrievalError::Config("no document store configured".to_string()))?;
        let (router, catalog, config) = self.router_parts()?;

        let strategy = RetrievalStrategy::new(store.clone(), &config);
        let comparison =
            ComparisonEngine::new(catalog.clone(), store, config.feature_k, config.comparison_k);

        info!(
            "Support assistant ready for {} products",
            catalog.products().len()
        );

        Ok(SupportAssistant {
            config,
            catalog,
            router,
            strategy,
            comparison,
        })
    }

    fn router_parts(self) -> Result<(QuestionRouter, Arc<ProductCatalog>, RetrievalConfig)> {
        self.config.validate()?;

        let catalog = Arc::new(self.catalog.unwrap_or_else(ProductCatalog::reference));
        let patterns = Arc::new(match self.patterns {
            Some(patterns) => patterns,
            None => PatternSet::reference()?,
        });

        let identifier = CdpIdentifier::new(catalog.clone(), self.config.min_similarity)?;
        let router = QuestionRouter {
            classifier: QuestionClassifier::new(catalog.clone(), patterns.clone(), identifier),
            advanced: AdvancedRouter::new(catalog.clone(), patterns),
            advanced_enabled: self.config.advanced_enabled,
        };
        Ok((router, catalog, self.config))
    }
}

impl Default for SupportAssistantBuilder {
    fn default() -> Self {
        Self::new()
    }
}
