//! Client abstraction for the external language-generation service.
//!
//! The pipeline only depends on [`GenerationClient`]: a request carries a model identifier, an
//! ordered list of role-tagged messages and a sampling temperature, and the response is plain
//! text. The production adapter speaks the OpenAI-compatible chat-completions protocol over
//! `reqwest`; tests substitute fakes or point the adapter at a mock server.

mod limiter;

pub use limiter::ConcurrencyLimitedClient;

use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while talking to the generation service.
#[derive(Debug, Error)]
pub enum GenerationClientError {
    /// Service could not be reached, or rejected the request before generating.
    #[error("Generation service unavailable: {0}")]
    ProviderUnavailable(String),
    /// Service returned an error response.
    #[error("Failed to generate text: {0}")]
    GenerationFailed(String),
    /// Service response could not be parsed or carried no text.
    #[error("Malformed generation response: {0}")]
    InvalidResponse(String),
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instruction framing the assistant's behaviour.
    System,
    /// Task content supplied by the caller.
    User,
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    /// Message author.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request payload passed to the generation service.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// Model identifier understood by the service.
    pub model: String,
    /// Ordered conversation sent to the model.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature; low values favour reproducible output.
    pub temperature: f32,
}

/// Interface implemented by generation backends.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for the supplied conversation.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationClientError>;
}

/// Build the process-wide generation client from configuration.
///
/// The client is created once and shared through an `Arc`; when
/// `GENERATION_MAX_CONCURRENT_REQUESTS` is set it is wrapped in a semaphore limiter so every
/// pipeline invocation in the process shares the same budget.
pub fn build_generation_client(
    config: &Config,
) -> Result<Arc<dyn GenerationClient>, GenerationClientError> {
    let client = OpenAiGenerationClient::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        Duration::from_secs(config.generation_timeout_secs),
    )?;
    match config.max_concurrent_requests {
        Some(limit) => {
            tracing::info!(limit, "Limiting concurrent generation requests");
            Ok(Arc::new(ConcurrencyLimitedClient::new(client, limit)))
        }
        None => Ok(Arc::new(client)),
    }
}

/// Adapter for OpenAI-compatible `chat/completions` endpoints.
pub struct OpenAiGenerationClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiGenerationClient {
    /// Construct a client for `base_url` (for example `https://api.openai.com/v1`).
    pub fn new(
        base_url: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, GenerationClientError> {
        let http = Client::builder()
            .user_agent("rusty-digest/summary")
            .timeout(timeout)
            .build()
            .map_err(|error| {
                GenerationClientError::ProviderUnavailable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl GenerationClient for OpenAiGenerationClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationClientError> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            temperature = request.temperature,
            "Sending generation request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                GenerationClientError::ProviderUnavailable(format!(
                    "failed to reach generation service at {}: {error}",
                    self.base_url
                ))
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationClientError::ProviderUnavailable(format!(
                "{} returned {status}: {body}",
                self.endpoint()
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationClientError::GenerationFailed(format!(
                "generation service returned {status}: {body}"
            )));
        }

        let body: CompletionResponse = response.json().await.map_err(|error| {
            GenerationClientError::InvalidResponse(format!(
                "failed to decode completion response: {error}"
            ))
        })?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationClientError::InvalidResponse(
                "completion carried no message content".into(),
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn client_for(server: &MockServer) -> OpenAiGenerationClient {
        OpenAiGenerationClient::new(server.url("/v1"), "sk-test".into(), Duration::from_secs(5))
            .expect("client")
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "gpt-test".into(),
            messages: vec![
                ChatMessage::system("You summarize."),
                ChatMessage::user("Summarize this."),
            ],
            temperature: 0.2,
        }
    }

    #[tokio::test]
    async fn openai_client_sends_messages_and_trims_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .json_body_partial(
                        json!({
                            "model": "gpt-test",
                            "messages": [
                                { "role": "system", "content": "You summarize." },
                                { "role": "user", "content": "Summarize this." }
                            ]
                        })
                        .to_string(),
                    );
                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "  - point one\n" } }
                    ]
                }));
            })
            .await;

        let text = client_for(&server)
            .generate(request())
            .await
            .expect("generation");

        mock.assert_async().await;
        assert_eq!(text, "- point one");
    }

    #[tokio::test]
    async fn openai_client_reports_error_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(429).body("quota exceeded");
            })
            .await;

        let error = client_for(&server)
            .generate(request())
            .await
            .expect_err("error response");

        assert!(
            matches!(&error, GenerationClientError::GenerationFailed(message) if message.contains("429") && message.contains("quota")),
            "unexpected error: {error:?}"
        );
    }

    #[tokio::test]
    async fn openai_client_rejects_empty_choices() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let error = client_for(&server)
            .generate(request())
            .await
            .expect_err("empty completion");

        assert!(matches!(error, GenerationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn openai_client_treats_unauthorized_as_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(401).body("bad key");
            })
            .await;

        let error = client_for(&server)
            .generate(request())
            .await
            .expect_err("unauthorized");

        assert!(matches!(error, GenerationClientError::ProviderUnavailable(_)));
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = OpenAiGenerationClient::new(
            "https://api.example.com/v1/".into(),
            "sk".into(),
            Duration::from_secs(1),
        )
        .expect("client");
        assert_eq!(client.endpoint(), "https://api.example.com/v1/chat/completions");
    }
}
