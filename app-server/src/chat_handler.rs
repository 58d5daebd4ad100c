//! Chat handler for the app-server.
//!
//! Routes a question through the assistant, gathers feature comparison data
//! for comparison questions, and asks the synthesizer for the answer.

use std::sync::Arc;

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use cdp_retrieval::{
    Classification, QuestionKind, RetrievalError, SupportAssistant, extract_feature,
};
use cdp_synthesis::{ResponseSynthesizer, SynthesisError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

/// Body of `POST /api/chat`. A missing question is treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
}

/// The product a how-to answer is about, or the products of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub question_type: QuestionKind,
    pub cdp: Option<ProductRef>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    RetrievalUnavailable(String),
    #[error("language model not configured")]
    ModelUnavailable,
    #[error("language model error: {0}")]
    Model(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RetrievalError> for ApiError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::Unavailable { .. } => ApiError::RetrievalUnavailable(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<SynthesisError> for ApiError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::ModelNotConfigured => ApiError::ModelUnavailable,
            SynthesisError::MissingVariable { .. } => ApiError::Internal(err.to_string()),
            other => ApiError::Model(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RetrievalUnavailable(_) | ApiError::ModelUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Model(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// Handler for chat requests. Cheap to share behind an `Arc`.
pub struct ChatHandler {
    assistant: Arc<SupportAssistant>,
    synthesizer: Arc<ResponseSynthesizer>,
}

impl ChatHandler {
    pub fn new(assistant: Arc<SupportAssistant>, synthesizer: Arc<ResponseSynthesizer>) -> Self {
        Self {
            assistant,
            synthesizer,
        }
    }

    pub fn assistant(&self) -> &SupportAssistant {
        &self.assistant
    }

    /// Answer one question.
    ///
    /// Retrieval failures are reported as errors rather than answered from
    /// an empty context.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
        let routed = self.assistant.route(&request.question).await.map_err(|e| {
            error!("Retrieval failed: {e}");
            ApiError::from(e)
        })?;

        // A comparison with no identified feature is answered from the
        // routed passages alone.
        let comparison = match &routed.classification {
            Classification::Comparison { question, products }
                if self.assistant.config().feature_snippets =>
            {
                match extract_feature(question) {
                    Some(feature) => {
                        info!("Comparing {} on {feature}", products.join(", "));
                        Some(self.assistant.compare(question, products).await?)
                    }
                    None => None,
                }
            }
            _ => None,
        };

        let response = self
            .synthesizer
            .generate(&routed, comparison.as_ref())
            .await
            .map_err(|e| {
                error!("Answer generation failed: {e}");
                ApiError::from(e)
            })?;

        let classification = &routed.classification;
        let cdp = match classification {
            Classification::HowTo { product, .. } => Some(ProductRef::One(product.clone())),
            Classification::Comparison { products, .. } => {
                Some(ProductRef::Many(products.clone()))
            }
            Classification::Ambiguous { .. } | Classification::Unrelated { .. } => None,
        };

        Ok(ChatResponse {
            response,
            question_type: classification.kind(),
            cdp,
        })
    }
}
