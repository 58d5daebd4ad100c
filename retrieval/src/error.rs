//! Error types for question routing and retrieval.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur while routing a question or fetching documents.
///
/// `unrelated` and `ambiguous` questions are ordinary classifications, not
/// errors.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Static configuration is unusable (empty catalog, empty sample
    /// corpus, invalid pattern). Raised at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The document store failed. Never replaced by an empty result.
    #[error("retrieval unavailable{}: {message}", product_suffix(.product))]
    Unavailable {
        /// Product filter of the failing search, if any.
        product: Option<String>,
        /// What went wrong.
        message: String,
    },

    /// Embedding error.
    #[error("embedding error: {0}")]
    Embedding(#[from] cdp_embeddings::EmbeddingError),

    /// Configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RetrievalError {
    /// Build an [`RetrievalError::Unavailable`] for a search.
    pub fn unavailable(product: Option<&str>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            product: product.map(str::to_string),
            message: message.into(),
        }
    }
}

fn product_suffix(product: &Option<String>) -> String {
    product
        .as_ref()
        .map(|p| format!(" (product {p})"))
        .unwrap_or_default()
}
