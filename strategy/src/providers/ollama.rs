use async_trait::async_trait;
use errors::ProviderError;
use serde::{Deserialize, Serialize};
use st_core::{CompletionRequest, ModelProvider};
use std::time::Duration;

use super::{http_client, post_with_fallback};

const PROVIDER: &str = "ollama";

pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// A local or remote Ollama daemon, non-streaming `/api/generate`.
#[derive(Debug)]
pub struct OllamaProvider {
    client: reqwest::Client,
    endpoints: Vec<String>,
    model: String
}

impl OllamaProvider {
    pub fn new(endpoints: Vec<String>, model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client(PROVIDER, timeout)?,
            endpoints,
            model: model.to_string()
        })
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    #[serde(skip_serializing_if = "GenerateOptions::is_empty")]
    options: GenerateOptions
}

#[derive(Serialize, Default)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>
}

impl GenerateOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.num_predict.is_none()
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens
            }
        };

        let response: GenerateResponse = post_with_fallback(
            &self.client,
            PROVIDER,
            &self.endpoints,
            "/api/generate",
            None,
            &body
        )
        .await?;

        Ok(response.response)
    }
}
