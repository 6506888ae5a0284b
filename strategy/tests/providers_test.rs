use errors::ProviderError;
use serde_json::json;
use st_core::{CompletionRequest, ModelProvider};
use std::time::Duration;
use strategy::{OllamaProvider, OpenAiCompatibleProvider};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn chat_reply(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": content }, "finish_reason": "stop" }
        ]
    })
}

#[tokio::test]
async fn test_openai_sends_model_messages_and_bearer_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "messages": [
                { "role": "system", "content": "be terse" },
                { "role": "user", "content": "write fizzbuzz" }
            ],
            "temperature": 0.5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("fn fizzbuzz() {}")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenAiCompatibleProvider::new(
        vec![format!("{}/v1", mock_server.uri())],
        "gpt-4o-mini",
        TIMEOUT
    )
    .unwrap()
    .with_api_key("sk-test");

    let mut request = CompletionRequest::new("write fizzbuzz").with_system("be terse");
    request.temperature = Some(0.5);

    let answer = provider.complete(&request).await.unwrap();
    assert_eq!(answer, "fn fizzbuzz() {}");
}

#[tokio::test]
async fn test_openai_falls_back_to_next_endpoint() {
    let failing = MockServer::start().await;
    let healthy = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&failing)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_reply("ok")))
        .expect(1)
        .mount(&healthy)
        .await;

    let provider = OpenAiCompatibleProvider::new(
        vec![
            "http://127.0.0.1:1".to_string(),
            failing.uri(),
            format!("{}/", healthy.uri()),
        ],
        "local-model",
        TIMEOUT
    )
    .unwrap();

    let answer = provider
        .complete(&CompletionRequest::new("ping"))
        .await
        .unwrap();
    assert_eq!(answer, "ok");
}

#[tokio::test]
async fn test_openai_all_endpoints_failing_is_unavailable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let provider =
        OpenAiCompatibleProvider::new(vec![mock_server.uri()], "m", TIMEOUT).unwrap();
    let err = provider
        .complete(&CompletionRequest::new("ping"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Unavailable { .. }));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_openai_malformed_body_is_invalid_response() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&mock_server)
        .await;

    let provider =
        OpenAiCompatibleProvider::new(vec![mock_server.uri()], "m", TIMEOUT).unwrap();
    let err = provider
        .complete(&CompletionRequest::new("ping"))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "PROVIDER_INVALID_RESPONSE");
}

#[tokio::test]
async fn test_openai_without_choices_is_invalid_response() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&mock_server)
        .await;

    let provider =
        OpenAiCompatibleProvider::new(vec![mock_server.uri()], "m", TIMEOUT).unwrap();
    let err = provider
        .complete(&CompletionRequest::new("ping"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_ollama_generate_is_non_streaming() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "codellama",
            "prompt": "write a parser",
            "stream": false,
            "options": { "num_predict": 128 }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "model": "codellama", "response": "def parse(): pass", "done": true }))
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OllamaProvider::new(vec![mock_server.uri()], "codellama", TIMEOUT).unwrap();
    let mut request = CompletionRequest::new("write a parser");
    request.max_tokens = Some(128);

    let answer = provider.complete(&request).await.unwrap();
    assert_eq!(answer, "def parse(): pass");
}
