//! Language models that turn a prompt into answer text.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SynthesisError};

/// Anything that completes a single prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Whether the model can be called at all (API key present, etc.).
    fn is_available(&self) -> bool;
}

/// Model behind an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAIChatModel {
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAIChatModel {
    /// Create a model client, reading the key from `OPENAI_API_KEY`.
    pub fn new() -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for OpenAIChatModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(SynthesisError::ModelNotConfigured)?;

        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }]
        });

        debug!("Requesting completion from {} ({} prompt chars)", self.model, prompt.len());

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
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
            return Err(SynthesisError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SynthesisError::ApiRequest(format!("{status}: {error_text}")));
        }

        let completion: ChatCompletion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| SynthesisError::InvalidResponse("no choices in response".to_string()))
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_complete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": "Say hi" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "  Hi!\n" } }]
            })))
            .mount(&server)
            .await;

        let model = OpenAIChatModel::new()
            .with_api_key("test-key")
            .with_base_url(server.uri());

        assert_eq!(model.complete("Say hi").await.unwrap(), "Hi!");
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let model = OpenAIChatModel::new()
            .with_api_key("test-key")
            .with_base_url(server.uri());

        assert!(matches!(
            model.complete("Say hi").await,
            Err(SynthesisError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_server_error_and_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let model = OpenAIChatModel::new()
            .with_api_key("test-key")
            .with_base_url(server.uri());

        assert!(matches!(
            model.complete("Say hi").await,
            Err(SynthesisError::RateLimited { retry_after_secs: 3 })
        ));
        match model.complete("Say hi").await {
            Err(SynthesisError::ApiRequest(message)) => assert!(message.contains("boom")),
            other => panic!("expected ApiRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_key() {
        let model = OpenAIChatModel {
            api_key: None,
            ..OpenAIChatModel::new()
        };
        assert!(!model.is_available());
        assert!(matches!(
            model.complete("Say hi").await,
            Err(SynthesisError::ModelNotConfigured)
        ));
    }
}
