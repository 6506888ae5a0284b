//! Model providers: HTTP backends with ordered endpoint fallback, plus a
//! deterministic mock.

mod mock;
mod ollama;
mod openai;

pub use mock::MockModelProvider;
pub use ollama::{DEFAULT_OLLAMA_ENDPOINT, OllamaProvider};
pub use openai::OpenAiCompatibleProvider;

use config::ProviderConfig;
use errors::ProviderError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use st_core::ModelProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::telemetry::Telemetry;

/// Build the provider selected by configuration.
pub fn provider_from_config(config: &ProviderConfig) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    match config.provider.as_str() {
        "openai" => {
            let mut provider =
                OpenAiCompatibleProvider::new(config.endpoints.clone(), &config.model, timeout)?;
            if let Some(key) = &config.api_key {
                provider = provider.with_api_key(key);
            }
            Ok(Arc::new(provider))
        }
        "ollama" => {
            // The stock endpoint list points at OpenAI; swap in the local daemon.
            let endpoints = if config.endpoints == ProviderConfig::default().endpoints {
                vec![DEFAULT_OLLAMA_ENDPOINT.to_string()]
            } else {
                config.endpoints.clone()
            };
            Ok(Arc::new(OllamaProvider::new(endpoints, &config.model, timeout)?))
        }
        "mock" => Ok(Arc::new(MockModelProvider::new(&config.model))),
        other => Err(ProviderError::NotConfigured {
            provider: other.to_string()
        })
    }
}

pub(crate) fn http_client(provider: &str, timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::NotConfigured {
            provider: format!("{provider} ({e})")
        })
}

/// POST `body` to `path` on each endpoint in turn until one answers with
/// a success status and a body that decodes as `T`.
pub(crate) async fn post_with_fallback<B, T>(
    client: &reqwest::Client,
    provider: &str,
    endpoints: &[String],
    path: &str,
    api_key: Option<&str>,
    body: &B
) -> Result<T, ProviderError>
where
    B: Serialize + Sync,
    T: DeserializeOwned
{
    let mut last_error = ProviderError::NotConfigured {
        provider: provider.to_string()
    };

    for (attempt, endpoint) in endpoints.iter().enumerate() {
        if attempt > 0 {
            Telemetry::record_provider_fallback(provider);
        }
        let url = format!("{}{}", endpoint.trim_end_matches('/'), path);

        let mut request = client.post(&url).json(body);
        if let Some(key) = api_key {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(provider, endpoint = %endpoint, error = %e, "Endpoint unreachable");
                last_error = ProviderError::unavailable(provider, e.to_string());
                continue;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(provider, endpoint = %endpoint, %status, "Endpoint returned an error status");
            last_error = ProviderError::unavailable(provider, format!("HTTP {status}: {detail}"));
            continue;
        }

        match response.json::<T>().await {
            Ok(decoded) => {
                debug!(provider, endpoint = %endpoint, "Completion received");
                return Ok(decoded);
            }
            Err(e) => {
                warn!(provider, endpoint = %endpoint, error = %e, "Undecodable response");
                last_error = ProviderError::InvalidResponse {
                    provider: provider.to_string(),
                    reason: e.to_string()
                };
            }
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_config_selects_backend() {
        let mut config = ProviderConfig::default();
        assert_eq!(provider_from_config(&config).unwrap().name(), "mock");

        config.provider = "openai".to_string();
        assert_eq!(provider_from_config(&config).unwrap().name(), "openai");

        config.provider = "ollama".to_string();
        assert_eq!(provider_from_config(&config).unwrap().name(), "ollama");

        config.provider = "telepathy".to_string();
        assert!(matches!(
            provider_from_config(&config),
            Err(ProviderError::NotConfigured { .. })
        ));
    }
}
