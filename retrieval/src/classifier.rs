//! Question classification.
//!
//! Rules are evaluated in a fixed order and the first one that fires wins:
//!
//! 1. **comparison**: two or more products are named, or a comparison cue
//!    matches. The product list is the named products when there are at
//!    least two of them, otherwise the whole catalog.
//! 2. **how-to**: a how-to cue matches. The product comes from
//!    [`CdpIdentifier`]; without one the question is **ambiguous**.
//! 3. **unrelated**: everything else, including empty input.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::advanced::AdvancedIntent;
use crate::catalog::ProductCatalog;
use crate::identifier::CdpIdentifier;
use crate::patterns::PatternSet;

/// Top-level kind of a classified question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    HowTo,
    Comparison,
    Ambiguous,
    Unrelated,
}

impl QuestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::HowTo => "how-to",
            QuestionKind::Comparison => "comparison",
            QuestionKind::Ambiguous => "ambiguous",
            QuestionKind::Unrelated => "unrelated",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one question. The payload is fixed by the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Classification {
    HowTo {
        question: String,
        product: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        advanced: Option<AdvancedIntent>,
    },
    Comparison {
        question: String,
        products: Vec<String>,
    },
    Ambiguous {
        question: String,
    },
    Unrelated {
        question: String,
    },
}

impl Classification {
    pub fn kind(&self) -> QuestionKind {
        match self {
            Classification::HowTo { .. } => QuestionKind::HowTo,
            Classification::Comparison { .. } => QuestionKind::Comparison,
            Classification::Ambiguous { .. } => QuestionKind::Ambiguous,
            Classification::Unrelated { .. } => QuestionKind::Unrelated,
        }
    }

    /// The question, verbatim.
    pub fn question(&self) -> &str {
        match self {
            Classification::HowTo { question, .. }
            | Classification::Comparison { question, .. }
            | Classification::Ambiguous { question }
            | Classification::Unrelated { question } => question,
        }
    }

    /// Products the classification refers to; empty for ambiguous and
    /// unrelated questions.
    pub fn products(&self) -> Vec<&str> {
        match self {
            Classification::HowTo { product, .. } => vec![product.as_str()],
            Classification::Comparison { products, .. } => {
                products.iter().map(String::as_str).collect()
            }
            Classification::Ambiguous { .. } | Classification::Unrelated { .. } => Vec::new(),
        }
    }

    /// Advanced refinement, if this is a refined how-to question.
    pub fn advanced(&self) -> Option<&AdvancedIntent> {
        match self {
            Classification::HowTo { advanced, .. } => advanced.as_ref(),
            _ => None,
        }
    }
}

/// Composes the pattern matcher and the product identifier.
pub struct QuestionClassifier {
    catalog: Arc<ProductCatalog>,
    patterns: Arc<PatternSet>,
    identifier: CdpIdentifier,
}

impl QuestionClassifier {
    pub fn new(
        catalog: Arc<ProductCatalog>,
        patterns: Arc<PatternSet>,
        identifier: CdpIdentifier,
    ) -> Self {
        Self {
            catalog,
            patterns,
            identifier,
        }
    }

    pub fn identifier(&self) -> &CdpIdentifier {
        &self.identifier
    }

    /// Classify `question`. Never fails; odd input is `unrelated`.
    pub fn classify(&self, question: &str) -> Classification {
        let lowered = question.to_lowercase();
        let mentioned = self.catalog.mentioned(&lowered);

        let classification = if mentioned.len() >= 2 || self.patterns.has_comparison_cue(&lowered)
        {
            let products = if mentioned.len() >= 2 {
                mentioned.iter().map(|p| p.id.clone()).collect()
            } else {
                self.catalog.ids().into_iter().map(str::to_string).collect()
            };
            Classification::Comparison {
                question: question.to_string(),
                products,
            }
        } else if self.patterns.is_how_to(&lowered) {
            match self.identifier.identify(question) {
                Some(product) => Classification::HowTo {
                    question: question.to_string(),
                    product,
                    advanced: None,
                },
                None => Classification::Ambiguous {
                    question: question.to_string(),
                },
            }
        } else {
            Classification::Unrelated {
                question: question.to_string(),
            }
        };

        debug!(
            "Classified question as {} {:?}",
            classification.kind(),
            classification.products()
        );
        classification
    }
}
