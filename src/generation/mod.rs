//! Chat-completion client used for summaries and answers.
//!
//! One adapter is provided: the hosted OpenAI chat-completions API, reached over plain
//! `reqwest`. Calls are single-shot; a failed or malformed response propagates as a hard
//! [`GenerationClientError`] with no retry and no fallback output.

use crate::config::get_config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced while generating text with the external model.
#[derive(Debug, Error)]
pub enum GenerationClientError {
    /// Provider could not be reached.
    #[error("Generation provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by generation backends.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Issue one chat-completion call with a system instruction and a user prompt,
    /// returning the trimmed response text.
    async fn complete(&self, system: &str, user: String)
    -> Result<String, GenerationClientError>;
}

/// Build a generation client from configuration.
pub fn get_generation_client() -> Box<dyn GenerationClient + Send + Sync> {
    let config = get_config();
    Box::new(OpenAiGenerationClient::new(
        config.openai_base_url.clone(),
        config.openai_api_key.clone(),
        config.generation_model.clone(),
    ))
}

/// Chat-completion adapter for the hosted OpenAI API.
pub struct OpenAiGenerationClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiGenerationClient {
    /// Construct a client targeting the given OpenAI-compatible base URL.
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        let http = Client::builder()
            .user_agent("snapqa/generate")
            .build()
            .expect("Failed to construct reqwest::Client for generation");
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Debug, Deserialize)]
struct ChatMessageBody {
    content: String,
}

#[async_trait]
impl GenerationClient for OpenAiGenerationClient {
    async fn complete(
        &self,
        system: &str,
        user: String,
    ) -> Result<String, GenerationClientError> {
        tracing::debug!(model = %self.model, prompt_chars = user.len(), "Requesting completion");
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ]
        });

        let mut request = self.http.post(self.endpoint()).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|error| {
            GenerationClientError::ProviderUnavailable(format!(
                "failed to reach generation API at {}: {error}",
                self.base_url
            ))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationClientError::GenerationFailed(format!(
                "generation API returned {status}: {body}"
            )));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            GenerationClientError::InvalidResponse(format!(
                "failed to decode completion response: {error}"
            ))
        })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                GenerationClientError::InvalidResponse("completion had no choices".to_string())
            })?;

        Ok(choice.message.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    #[tokio::test]
    async fn openai_client_returns_trimmed_content() {
        let server = MockServer::start_async().await;
        let client = OpenAiGenerationClient::new(
            server.base_url(),
            Some("sk-test".into()),
            "gpt-4o-mini".into(),
        );

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-test");
                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "  An answer.\n" } }
                    ]
                }));
            })
            .await;

        let answer = client
            .complete("You answer questions.", "Question: why?".into())
            .await
            .expect("completion");

        mock.assert();
        assert_eq!(answer, "An answer.");
    }

    #[tokio::test]
    async fn openai_client_rejects_empty_choices() {
        let server = MockServer::start_async().await;
        let client =
            OpenAiGenerationClient::new(server.base_url(), None, "gpt-4o-mini".into());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let error = client
            .complete("system", "user".into())
            .await
            .expect_err("no choices");
        assert!(matches!(error, GenerationClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn openai_client_surfaces_error_status() {
        let server = MockServer::start_async().await;
        let client =
            OpenAiGenerationClient::new(server.base_url(), None, "gpt-4o-mini".into());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(500).body("boom");
            })
            .await;

        let error = client
            .complete("system", "user".into())
            .await
            .expect_err("error response");
        assert!(matches!(error, GenerationClientError::GenerationFailed(_)));
    }
}
