use crate::services::TextGenerator;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Why a generative narrative attempt produced nothing usable
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Generative service unavailable: no credential configured")]
    Unavailable,

    #[error("Generative service error: {0}")]
    Provider(String),

    #[error("Generative service timed out after {0:?}")]
    Timeout(Duration),

    #[error("Generative service returned an empty response")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiCompatibleClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl OpenAiCompatibleClient {
    pub fn new(client: Client, base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
            client,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleClient {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, GenerationError> {
        let api_key = self.api_key.as_ref().ok_or(GenerationError::Unavailable)?;

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a knowledgeable local guide speaking to a visitor.",
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.9,
            max_tokens: 400,
        };

        tracing::debug!("Requesting narrative from {} ({} prompt chars)", self.model, prompt.len());

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(timeout)
                } else {
                    GenerationError::Provider(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Provider(format!("status {}: {}", status, body)));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(timeout)
            } else {
                GenerationError::Provider(format!("malformed response: {}", e))
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}
