//! Term-frequency / inverse-document-frequency vector space.
//!
//! The model is fit once over a fixed corpus and is read-only afterwards.
//! Tokens are maximal runs of word characters (alphanumerics and `_`) of
//! length two or more, taken from the lowercased text. Weights are raw term
//! counts scaled by the smoothed IDF `ln((1 + n) / (1 + df)) + 1`, and every
//! transformed vector is L2-normalized. An optional stop-word list removes
//! terms before counting.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::similarity::normalize;

/// Common English function words.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "about", "am", "an", "and", "any", "are", "as", "at", "be", "been", "but", "by", "can",
    "could", "did", "do", "does", "for", "from", "had", "has", "have", "how", "if", "in", "into",
    "is", "it", "its", "me", "my", "no", "not", "of", "on", "or", "our", "should", "so", "some",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
    "to", "up", "us", "was", "we", "were", "what", "when", "where", "which", "who", "why",
    "will", "with", "would", "you", "your",
];

/// A fitted TF-IDF model.
///
/// There is no unfitted state: [`TfidfModel::fit`] either returns a usable
/// model or an error.
#[derive(Debug, Clone)]
pub struct TfidfModel {
    /// Term to column index, in lexicographic term order.
    vocabulary: BTreeMap<String, usize>,

    /// IDF weight per column.
    idf: Vec<f32>,

    /// Number of documents the model was fit on.
    documents: usize,

    /// Terms dropped before counting.
    stop_words: BTreeSet<String>,
}

impl TfidfModel {
    /// Fit a model over `corpus`.
    ///
    /// Fails when the corpus is empty or contains no tokens at all.
    pub fn fit<I, S>(corpus: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::fit_with_stop_words(corpus, &[])
    }

    /// Fit a model over `corpus`, ignoring `stop_words` everywhere.
    pub fn fit_with_stop_words<I, S>(corpus: I, stop_words: &[&str]) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stop_words: BTreeSet<String> = stop_words.iter().map(|w| w.to_lowercase()).collect();
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        let mut documents = 0usize;

        for text in corpus {
            documents += 1;
            let unique: BTreeSet<String> = tokenize(text.as_ref())
                .into_iter()
                .filter(|term| !stop_words.contains(term))
                .collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if documents == 0 {
            return Err(EmbeddingError::EmptyCorpus("corpus is empty".to_string()));
        }
        if document_frequency.is_empty() {
            return Err(EmbeddingError::EmptyCorpus(
                "corpus contains no tokens".to_string(),
            ));
        }

        let n = documents as f32;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (column, (term, df)) in document_frequency.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f32)).ln() + 1.0);
            vocabulary.insert(term, column);
        }

        debug!(
            "Fit TF-IDF model over {documents} documents, {} terms",
            vocabulary.len()
        );

        Ok(Self {
            vocabulary,
            idf,
            documents,
            stop_words,
        })
    }

    /// Map `text` into the model's vector space.
    ///
    /// Terms outside the vocabulary are ignored; text with no known terms
    /// maps to the zero vector.
    pub fn transform(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.idf.len()];
        for term in tokenize(text) {
            if self.stop_words.contains(&term) {
                continue;
            }
            if let Some(&column) = self.vocabulary.get(&term) {
                vector[column] += 1.0;
            }
        }
        for (value, weight) in vector.iter_mut().zip(&self.idf) {
            *value *= weight;
        }
        normalize(&mut vector);
        vector
    }

    /// Number of columns in every transformed vector.
    pub fn dimension(&self) -> usize {
        self.idf.len()
    }

    /// Number of documents the model was fit on.
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// IDF weight of `term`, if it is in the vocabulary.
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).map(|&column| self.idf[column])
    }
}

/// Split lowercased `text` into tokens of two or more word characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}
