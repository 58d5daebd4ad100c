//! Prompt templates with `{name}` placeholders.

use std::collections::HashMap;

use cdp_retrieval::AdvancedKind;

use crate::error::{Result, SynthesisError};

/// A named prompt with `{variable}` placeholders.
///
/// Braces that do not enclose a plain identifier are copied verbatim, so
/// templates may contain JSON or code samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: String,
    template: String,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placeholder names, in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in parse(&self.template) {
            if let Segment::Variable(name) = segment
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        names
    }

    /// Fill every placeholder from `values`.
    pub fn render(&self, values: &HashMap<&str, String>) -> Result<String> {
        let mut out = String::with_capacity(self.template.len());
        for segment in parse(&self.template) {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Variable(name) => {
                    let value = values.get(name).ok_or_else(|| SynthesisError::MissingVariable {
                        template: self.name.clone(),
                        variable: name.to_string(),
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

enum Segment<'a> {
    Text(&'a str),
    Variable(&'a str),
}

fn parse(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let close = after.find('}');
        let name = close.map(|close| &after[..close]);

        match name {
            Some(name) if is_identifier(name) => {
                if open > 0 {
                    segments.push(Segment::Text(&rest[..open]));
                }
                segments.push(Segment::Variable(name));
                rest = &after[name.len() + 1..];
            }
            _ => {
                segments.push(Segment::Text(&rest[..=open]));
                rest = after;
            }
        }
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    segments
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

const HOW_TO: &str = "You are a helpful customer support assistant for Customer Data Platforms (CDPs).

A user asked the following question about {cdp}:
{question}

Relevant documentation:
{context}

Give a clear, step-by-step answer. Use headings, bullet points and code examples where they help.";

const COMPARISON: &str = "You are a helpful customer support assistant for Customer Data Platforms (CDPs).

A user asked a comparison question:
{question}

The question involves these CDPs: {cdps}

Relevant documentation:
{context}

Compare the CDPs on the aspect the user asked about, pointing out similarities and differences. Use a heading and bullet points for each CDP.";

const AMBIGUOUS: &str = "You are a helpful customer support assistant for Customer Data Platforms (CDPs).

A user asked the following question without saying which CDP they mean:
{question}

Relevant documentation from several CDPs:
{context}

Answer as helpfully as you can and say which CDP each part of the answer applies to. If it matters, ask the user which CDP they are using.";

const FALLBACK: &str = "You are a helpful customer support assistant for Customer Data Platforms (CDPs).

A user asked the following question:
{question}

The question does not appear to be about using a CDP.

Politely explain that you answer questions about how to use {cdps}, and ask whether they have a question about one of them.";

const IMPLEMENTATION: &str = "You are an implementation specialist for {cdp}.

A user asked an advanced implementation question:
{question}

Relevant documentation:
{context}

Give a detailed, step-by-step answer for this scenario. Include configuration or code examples where appropriate, and call out prerequisites, dependencies and likely obstacles.";

const TROUBLESHOOTING: &str = "You are a support engineer for {cdp}.

A user needs help with a problem:
{question}

Relevant documentation:
{context}

Write a troubleshooting guide covering:
1. Likely causes
2. How to diagnose each one
3. How to resolve each one
4. How to confirm the fix worked";

const BEST_PRACTICES: &str = "You are a consultant for {cdp}.

A user asked about best practices:
{question}

Relevant documentation:
{context}

Cover:
1. Widely used approaches
2. Recommendations specific to {cdp}
3. Performance tips
4. Security considerations
5. Common pitfalls";

const MIGRATION: &str = "You are a CDP migration specialist.

A user asked about migrating between {source_cdp} and {cdp}:
{question}

Relevant documentation:
{context}

Write a migration guide covering:
1. Planning and assessment
2. Data mapping
3. The migration steps
4. Validation afterwards
5. Common challenges and how to handle them";

/// The full set of templates the synthesizer chooses from.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    pub how_to: PromptTemplate,
    pub comparison: PromptTemplate,
    pub ambiguous: PromptTemplate,
    pub fallback: PromptTemplate,
    pub implementation: PromptTemplate,
    pub troubleshooting: PromptTemplate,
    pub best_practices: PromptTemplate,
    pub migration: PromptTemplate,
}

impl PromptLibrary {
    pub fn advanced(&self, kind: AdvancedKind) -> &PromptTemplate {
        match kind {
            AdvancedKind::Implementation => &self.implementation,
            AdvancedKind::Troubleshooting => &self.troubleshooting,
            AdvancedKind::BestPractices => &self.best_practices,
            AdvancedKind::Migration => &self.migration,
        }
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self {
            how_to: PromptTemplate::new("how-to", HOW_TO),
            comparison: PromptTemplate::new("comparison", COMPARISON),
            ambiguous: PromptTemplate::new("ambiguous", AMBIGUOUS),
            fallback: PromptTemplate::new("fallback", FALLBACK),
            implementation: PromptTemplate::new("implementation", IMPLEMENTATION),
            troubleshooting: PromptTemplate::new("troubleshooting", TROUBLESHOOTING),
            best_practices: PromptTemplate::new("best-practices", BEST_PRACTICES),
            migration: PromptTemplate::new("migration", MIGRATION),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_render() {
        let template = PromptTemplate::new("t", "Q: {question} about {cdp}. Again: {cdp}");
        let rendered = template
            .render(&values(&[("question", "how?"), ("cdp", "segment")]))
            .unwrap();
        assert_eq!(rendered, "Q: how? about segment. Again: segment");
        assert_eq!(template.variables(), vec!["question", "cdp"]);
    }

    #[test]
    fn test_non_identifier_braces_are_literal() {
        let template = PromptTemplate::new("t", r#"{"key": 1} {} { x } {name"#);
        assert_eq!(template.variables(), Vec::<&str>::new());
        assert_eq!(
            template.render(&HashMap::new()).unwrap(),
            r#"{"key": 1} {} { x } {name"#
        );
    }

    #[test]
    fn test_missing_variable() {
        let template = PromptTemplate::new("how-to", "{question} {context}");
        let err = template.render(&values(&[("question", "q")])).unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::MissingVariable { ref variable, .. } if variable == "context"
        ));
    }

    #[test]
    fn test_library_variables() {
        let library = PromptLibrary::default();
        assert_eq!(library.how_to.variables(), vec!["cdp", "question", "context"]);
        assert_eq!(library.comparison.variables(), vec!["question", "cdps", "context"]);
        assert_eq!(library.ambiguous.variables(), vec!["question", "context"]);
        assert_eq!(library.fallback.variables(), vec!["question", "cdps"]);
        assert_eq!(
            library.advanced(AdvancedKind::Migration).variables(),
            vec!["source_cdp", "cdp", "question", "context"]
        );
        for kind in AdvancedKind::PRIORITY {
            assert!(library.advanced(kind).variables().contains(&"context"));
        }
    }
}
