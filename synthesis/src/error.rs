//! Error types for answer synthesis.

use thiserror::Error;

/// Result type alias for synthesis operations.
pub type Result<T> = std::result::Result<T, SynthesisError>;

/// Errors that can occur while building a prompt or calling the model.
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// No API key was configured for the model.
    #[error("language model not configured")]
    ModelNotConfigured,

    /// The model endpoint rejected the request.
    #[error("model request failed: {0}")]
    ApiRequest(String),

    /// Rate limited by the model endpoint.
    #[error("rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// The endpoint answered with something that is not a completion.
    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    /// A template references a variable that was not supplied.
    #[error("template '{template}' is missing variable '{variable}'")]
    MissingVariable { template: String, variable: String },

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
