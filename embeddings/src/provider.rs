//! Embedding providers.
//!
//! Documentation passages and queries are embedded either remotely through
//! the OpenAI embeddings API or locally with a [`TfidfModel`] fit over the
//! passages themselves.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::tfidf::TfidfModel;

/// Request for generating embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Model to use (provider-specific).
    pub model: Option<String>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the default embedding dimension.
    fn default_dimension(&self) -> usize;

    /// Generate an embedding for the given text.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, requests: Vec<EmbeddingRequest>) -> Result<Vec<EmbeddingResponse>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            results.push(self.embed(request).await?);
        }
        Ok(results)
    }

    /// Check if the provider is usable (API key set, model fit, etc.).
    fn is_available(&self) -> bool;
}

/// OpenAI embedding provider.
pub struct OpenAIProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Default model.
    default_model: String,

    /// Most inputs sent in one `/embeddings` request.
    batch_size: usize,
}

/// Inputs per `/embeddings` request; the API rejects arrays over 2048.
pub const DEFAULT_BATCH_SIZE: usize = 256;

impl OpenAIProvider {
    /// Create a new OpenAI provider, reading the key from `OPENAI_API_KEY`.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::new(),
            default_model: "text-embedding-3-small".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set how many inputs go into one request. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Call the embeddings endpoint with one or more inputs.
    async fn request_embeddings(
        &self,
        model: &str,
        input: serde_json::Value,
    ) -> Result<OpenAIEmbeddingResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(EmbeddingError::ProviderNotConfigured)?;

        let body = serde_json::json!({
            "input": input,
            "model": model
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ApiRequest(format!(
                "{status}: {error_text}"
            )));
        }

        Ok(response.json().await?)
    }
}

impl Default for OpenAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn default_dimension(&self) -> usize {
        match self.default_model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let model = request
            .model
            .unwrap_or_else(|| self.default_model.clone());

        debug!("Generating embedding with model: {model}");

        let result = self
            .request_embeddings(&model, serde_json::json!(request.text))
            .await?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding in response".to_string()))?
            .embedding;

        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: result.model,
        })
    }

    async fn embed_batch(&self, requests: Vec<EmbeddingRequest>) -> Result<Vec<EmbeddingResponse>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let model = requests[0]
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone());
        debug!(
            "Generating batch embeddings for {} texts with model: {model} ({} per request)",
            requests.len(),
            self.batch_size
        );

        let mut responses = Vec::with_capacity(requests.len());
        for batch in requests.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|r| r.text.as_str()).collect();
            let mut result = self
                .request_embeddings(&model, serde_json::json!(texts))
                .await?;

            if result.data.len() != batch.len() {
                return Err(EmbeddingError::InvalidResponse(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    result.data.len()
                )));
            }

            // The API may return items out of order; `index` is authoritative.
            result.data.sort_by_key(|item| item.index);

            let response_model = result.model;
            responses.extend(result.data.into_iter().map(|item| EmbeddingResponse {
                dimension: item.embedding.len(),
                embedding: item.embedding,
                model: response_model.clone(),
            }));
        }

        info!("Generated {} batch embeddings", responses.len());

        Ok(responses)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// OpenAI API response format.
#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Local provider backed by a TF-IDF model.
///
/// Needs no network access; the model is usually fit over the same
/// passages that will later be searched.
pub struct TfidfProvider {
    model: TfidfModel,
}

impl TfidfProvider {
    /// Wrap an already fitted model.
    pub fn new(model: TfidfModel) -> Self {
        Self { model }
    }

    /// Fit a model over `corpus` and wrap it.
    pub fn fit<I, S>(corpus: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let model = TfidfModel::fit(corpus)?;
        info!(
            "Fit local TF-IDF provider over {} passages ({} terms)",
            model.documents(),
            model.dimension()
        );
        Ok(Self::new(model))
    }
}

#[async_trait]
impl EmbeddingProvider for TfidfProvider {
    fn name(&self) -> &str {
        "tfidf"
    }

    fn default_model(&self) -> &str {
        "tfidf"
    }

    fn default_dimension(&self) -> usize {
        self.model.dimension()
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let embedding = self.model.transform(&request.text);
        Ok(EmbeddingResponse {
            dimension: embedding.len(),
            embedding,
            model: self.default_model().to_string(),
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_embedding_request() {
        let request = EmbeddingRequest::new("Hello world").with_model("text-embedding-3-small");

        assert_eq!(request.text, "Hello world");
        assert_eq!(request.model, Some("text-embedding-3-small".to_string()));
    }

    #[test]
    fn test_openai_provider_default_dimensions() {
        let provider = OpenAIProvider::new().with_model("text-embedding-3-large");
        assert_eq!(provider.default_dimension(), 3072);

        let provider = OpenAIProvider::new().with_model("text-embedding-3-small");
        assert_eq!(provider.default_dimension(), 1536);
    }

    #[tokio::test]
    async fn test_openai_embed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.1, 0.2, 0.3], "index": 0 }],
                "model": "text-embedding-3-small"
            })))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new()
            .with_api_key("test-key")
            .with_base_url(server.uri());
        let response = provider.embed(EmbeddingRequest::new("hello")).await.unwrap();

        assert_eq!(response.dimension, 3);
        assert_eq!(response.model, "text-embedding-3-small");
    }

    #[tokio::test]
    async fn test_openai_batch_is_reordered_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "embedding": [0.0, 1.0], "index": 1 },
                    { "embedding": [1.0, 0.0], "index": 0 }
                ],
                "model": "text-embedding-3-small"
            })))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new()
            .with_api_key("test-key")
            .with_base_url(server.uri());
        let responses = provider
            .embed_batch(vec![EmbeddingRequest::new("a"), EmbeddingRequest::new("b")])
            .await
            .unwrap();

        assert_eq!(responses[0].embedding, vec![1.0, 0.0]);
        assert_eq!(responses[1].embedding, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_openai_batch_is_split_into_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({ "input": ["a", "b"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "embedding": [1.0, 0.0], "index": 0 },
                    { "embedding": [0.0, 1.0], "index": 1 }
                ],
                "model": "text-embedding-3-small"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({ "input": ["c", "d"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    { "embedding": [0.5, 0.5], "index": 0 },
                    { "embedding": [0.2, 0.8], "index": 1 }
                ],
                "model": "text-embedding-3-small"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(body_partial_json(serde_json::json!({ "input": ["e"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.9, 0.1], "index": 0 }],
                "model": "text-embedding-3-small"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new()
            .with_api_key("test-key")
            .with_base_url(server.uri())
            .with_batch_size(2);
        let requests = ["a", "b", "c", "d", "e"]
            .into_iter()
            .map(EmbeddingRequest::new)
            .collect();
        let responses = provider.embed_batch(requests).await.unwrap();

        let embeddings: Vec<Vec<f32>> = responses.into_iter().map(|r| r.embedding).collect();
        assert_eq!(
            embeddings,
            vec![
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![0.5, 0.5],
                vec![0.2, 0.8],
                vec![0.9, 0.1],
            ]
        );
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_openai_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new()
            .with_api_key("test-key")
            .with_base_url(server.uri());
        let err = provider.embed(EmbeddingRequest::new("hello")).await.unwrap_err();

        assert!(matches!(
            err,
            EmbeddingError::RateLimited {
                retry_after_secs: 7
            }
        ));
    }

    #[tokio::test]
    async fn test_openai_without_key_is_not_configured() {
        let provider = OpenAIProvider {
            api_key: None,
            ..OpenAIProvider::new()
        };
        assert!(!provider.is_available());
        let err = provider.embed(EmbeddingRequest::new("hello")).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ProviderNotConfigured));
    }

    #[tokio::test]
    async fn test_tfidf_provider_embeds_locally() {
        let provider =
            TfidfProvider::fit(["segment sources", "lytics audiences", "zeotap identity"]).unwrap();

        let batch = provider
            .embed_batch(vec![
                EmbeddingRequest::new("segment"),
                EmbeddingRequest::new("identity"),
            ])
            .await
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].dimension, provider.default_dimension());
        assert!(provider.is_available());
    }
}
