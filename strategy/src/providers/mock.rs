use async_trait::async_trait;
use errors::ProviderError;
use st_core::{CompletionRequest, ModelProvider};

/// Offline provider answering with a deterministic placeholder that
/// names the request it was given.
#[derive(Debug, Clone)]
pub struct MockModelProvider {
    model: String
}

impl MockModelProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string()
        }
    }
}

#[async_trait]
impl ModelProvider for MockModelProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let first_line = request.prompt.lines().next().unwrap_or_default();
        Ok(format!(
            "// {} (mock) response to: {}",
            self.model,
            first_line.trim()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_is_deterministic() {
        let provider = MockModelProvider::new("test-model");
        let request = CompletionRequest::new("Write code\nmore detail");
        let first = provider.complete(&request).await.unwrap();
        let second = provider.complete(&request).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "// test-model (mock) response to: Write code");
    }
}
