use async_trait::async_trait;
use errors::ProviderError;
use serde::{Deserialize, Serialize};
use st_core::{CompletionRequest, ModelProvider};
use std::time::Duration;

use super::{http_client, post_with_fallback};

const PROVIDER: &str = "openai";

/// Any server speaking the OpenAI chat-completions protocol.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    endpoints: Vec<String>,
    model: String,
    api_key: Option<String>
}

impl std::fmt::Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("endpoints", &self.endpoints)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleProvider {
    pub fn new(endpoints: Vec<String>, model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            endpoints,
            model: model.to_string(),
            api_key: None
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage {
                role: "system",
                content: system
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens
        };

        let response: ChatResponse = post_with_fallback(
            &self.client,
            PROVIDER,
            &self.endpoints,
            "/chat/completions",
            self.api_key.as_deref(),
            &body
        )
        .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: PROVIDER.to_string(),
                reason: "response contained no choices".to_string()
            })
    }
}
