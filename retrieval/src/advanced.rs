//! Advanced sub-intent routing for how-to questions.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::ProductCatalog;
use crate::patterns::{AdvancedKind, PatternSet};

/// Label used when a migration question names no other known product.
pub const OTHER_PRODUCT_LABEL: &str = "another CDP";

/// Where a migration starts from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum SourceProduct {
    /// A catalog product other than the target.
    Product(String),
    /// Nothing recognisable; some other system.
    Other,
}

impl SourceProduct {
    /// Product id, or the generic placeholder label.
    pub fn label(&self) -> &str {
        match self {
            SourceProduct::Product(id) => id,
            SourceProduct::Other => OTHER_PRODUCT_LABEL,
        }
    }
}

impl fmt::Display for SourceProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Advanced refinement attached to a how-to classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedIntent {
    pub kind: AdvancedKind,

    /// Only set for migrations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceProduct>,
}

/// Detects advanced sub-intent and, for migrations, the source product.
pub struct AdvancedRouter {
    catalog: Arc<ProductCatalog>,
    patterns: Arc<PatternSet>,
}

impl AdvancedRouter {
    pub fn new(catalog: Arc<ProductCatalog>, patterns: Arc<PatternSet>) -> Self {
        Self { catalog, patterns }
    }

    /// Advanced kind of `question`, first match in priority order.
    pub fn classify_advanced(&self, question: &str) -> Option<AdvancedKind> {
        self.patterns.advanced_kind(&question.to_lowercase())
    }

    /// First catalog product named in `question` that is not `target`.
    ///
    /// Never returns `target`.
    pub fn extract_source(&self, question: &str, target: &str) -> SourceProduct {
        let lowered = question.to_lowercase();
        self.catalog
            .products()
            .iter()
            .find(|p| p.id != target && lowered.contains(p.id.as_str()))
            .map_or(SourceProduct::Other, |p| SourceProduct::Product(p.id.clone()))
    }

    /// Full refinement for a how-to question about `target`.
    pub fn refine(&self, question: &str, target: &str) -> Option<AdvancedIntent> {
        let kind = self.classify_advanced(question)?;
        let source = (kind == AdvancedKind::Migration).then(|| self.extract_source(question, target));
        Some(AdvancedIntent { kind, source })
    }
}
