//! OpenAI-compatible chat-completions generator.
//!
//! Works against any endpoint that speaks the `/chat/completions` shape,
//! including Gemini's OpenAI compatibility layer (the default).

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::GenerationConfig;
use crate::domain::ports::TextGenerator;

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiCompatibleGenerator {
    config: GenerationConfig,
    api_key: String,
    client: Client,
}

impl OpenAiCompatibleGenerator {
    /// Build from config. Fails when no API key is configured or exported.
    pub fn new(config: GenerationConfig) -> DomainResult<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            DomainError::ValidationFailed(format!("{} not set and no generation.api_key configured", config.api_key_env))
        })?;

        // The pipeline bounds each call itself; this only guards a stuck socket.
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.saturating_add(5)))
            .build()
            .map_err(|e| DomainError::ValidationFailed(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, api_key, client })
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleGenerator {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, system_instruction: &str, user_content: &str) -> DomainResult<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage { role: "system", content: system_instruction },
                ChatMessage { role: "user", content: user_content },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header(header::CONTENT_TYPE, "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::GenerationFailed(format!("API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::GenerationFailed(format!("API error {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::GenerationFailed(format!("Failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DomainError::GenerationFailed("response carried no message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn config(base_url: String) -> GenerationConfig {
        GenerationConfig {
            base_url,
            model: "test-model".to_string(),
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generate_returns_first_choice_content() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJson(json!({
                "model": "test-model",
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "usr" }
                ]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "choices": [{ "message": { "role": "assistant", "content": "本文" } }] }).to_string())
            .create_async()
            .await;

        let generator = OpenAiCompatibleGenerator::new(config(server.url())).unwrap();
        let text = generator.generate("sys", "usr").await.unwrap();

        assert_eq!(text, "本文");
        assert_eq!(generator.name(), "test-model");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_error_is_generation_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let generator = OpenAiCompatibleGenerator::new(config(server.url())).unwrap();
        let err = generator.generate("sys", "usr").await.unwrap_err();

        assert!(err.is_generation_failure());
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_empty_choices_is_generation_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "choices": [] }).to_string())
            .create_async()
            .await;

        let generator = OpenAiCompatibleGenerator::new(config(server.url())).unwrap();
        assert!(matches!(generator.generate("s", "u").await, Err(DomainError::GenerationFailed(_))));
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let config = GenerationConfig {
            api_key: None,
            api_key_env: "SALON_REPORT_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        temp_env::with_var_unset("SALON_REPORT_TEST_UNSET_KEY", || {
            assert!(matches!(OpenAiCompatibleGenerator::new(config), Err(DomainError::ValidationFailed(_))));
        });
    }

    #[test]
    fn test_builders_override_key_and_model() {
        let generator = OpenAiCompatibleGenerator::new(config("http://localhost/v1/".to_string()))
            .unwrap()
            .with_api_key("other")
            .with_model("other-model");

        assert_eq!(generator.api_key, "other");
        assert_eq!(generator.name(), "other-model");
        assert_eq!(generator.endpoint(), "http://localhost/v1/chat/completions");
    }
}
