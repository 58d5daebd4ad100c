//! Choosing a template for a routed question and filling it in.

use std::collections::HashMap;
use std::sync::Arc;

use cdp_retrieval::{
    AdvancedKind, Classification, ComparisonData, Document, OTHER_PRODUCT_LABEL, ProductCatalog,
    ProductComparison, RoutedQuestion, SourceProduct,
};
use tracing::debug;

use crate::error::Result;
use crate::model::LanguageModel;
use crate::prompt::{PromptLibrary, PromptTemplate};

/// Turns a routed question into answer text.
///
/// Questions without passages, and unrelated questions, get the fallback
/// prompt, which names the products the assistant knows about.
pub struct ResponseSynthesizer {
    model: Arc<dyn LanguageModel>,
    catalog: Arc<ProductCatalog>,
    prompts: PromptLibrary,
}

impl ResponseSynthesizer {
    pub fn new(model: Arc<dyn LanguageModel>, catalog: Arc<ProductCatalog>) -> Self {
        Self {
            model,
            catalog,
            prompts: PromptLibrary::default(),
        }
    }

    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = prompts;
        self
    }

    /// Render the prompt and ask the model.
    pub async fn generate(
        &self,
        routed: &RoutedQuestion,
        comparison: Option<&ComparisonData>,
    ) -> Result<String> {
        let prompt = self.build_prompt(routed, comparison)?;
        self.model.complete(&prompt).await
    }

    /// The prompt [`ResponseSynthesizer::generate`] would send.
    pub fn build_prompt(
        &self,
        routed: &RoutedQuestion,
        comparison: Option<&ComparisonData>,
    ) -> Result<String> {
        let documents = &routed.documents;
        let (template, values) = match &routed.classification {
            Classification::HowTo {
                question,
                product,
                advanced,
            } if !documents.is_empty() => {
                let mut values = HashMap::from([
                    ("question", question.clone()),
                    ("cdp", product.clone()),
                    ("context", plain_context(documents)),
                ]);
                let template = match advanced {
                    Some(intent) => {
                        if intent.kind == AdvancedKind::Migration {
                            let source = intent
                                .source
                                .as_ref()
                                .map_or(OTHER_PRODUCT_LABEL, SourceProduct::label);
                            values.insert("source_cdp", source.to_string());
                        }
                        self.prompts.advanced(intent.kind)
                    }
                    None => &self.prompts.how_to,
                };
                (template, values)
            }
            Classification::Comparison { question, products } => {
                let context = match comparison {
                    Some(data) => comparison_context(data),
                    None => attributed_context(documents),
                };
                if context.is_empty() {
                    self.fallback(question)
                } else {
                    let values = HashMap::from([
                        ("question", question.clone()),
                        ("cdps", products.join(", ")),
                        ("context", context),
                    ]);
                    (&self.prompts.comparison, values)
                }
            }
            Classification::Ambiguous { question } if !documents.is_empty() => {
                let values = HashMap::from([
                    ("question", question.clone()),
                    ("context", attributed_context(documents)),
                ]);
                (&self.prompts.ambiguous, values)
            }
            other => self.fallback(other.question()),
        };

        debug!("Rendering '{}' prompt", template.name());
        template.render(&values)
    }

    fn fallback(&self, question: &str) -> (&PromptTemplate, HashMap<&'static str, String>) {
        let names: Vec<&str> = self.catalog.products().iter().map(|p| p.name.as_str()).collect();
        let values = HashMap::from([
            ("question", question.to_string()),
            ("cdps", join_names(&names)),
        ]);
        (&self.prompts.fallback, values)
    }
}

fn plain_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn attributed_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| format!("CDP: {}\n{}", doc.product(), doc.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn comparison_context(data: &ComparisonData) -> String {
    let mut blocks = Vec::new();
    for entry in &data.products {
        match entry {
            ProductComparison::Feature {
                product,
                feature,
                summary,
                documents,
            } => {
                let mut lines = vec![format!("CDP: {product}")];
                if let Some(summary) = summary {
                    lines.push(format!("{feature}: {summary}"));
                }
                lines.extend(documents.iter().map(|doc| doc.text.clone()));
                if lines.len() > 1 {
                    blocks.push(lines.join("\n"));
                }
            }
            ProductComparison::General { .. } => {
                blocks.extend(
                    entry
                        .documents()
                        .iter()
                        .map(|doc| format!("CDP: {}\n{}", entry.product(), doc.text)),
                );
            }
        }
    }
    blocks.join("\n\n")
}

/// "A, B, and C"
fn join_names(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [one] => (*one).to_string(),
        [first, second] => format!("{first} and {second}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}
