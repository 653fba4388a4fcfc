/*!
 * Unit tests for provider implementations
 */

use decktrans::errors::ProviderError;
use decktrans::providers::Provider;
use decktrans::providers::mock::{MockProvider, MockRequest};
use decktrans::providers::openai::{OpenAI, OpenAIRequest, OpenAIResponse};

fn mock_request(text: &str) -> MockRequest {
    MockRequest {
        text: text.to_string(),
        target_language: "ja".to_string(),
    }
}

#[tokio::test]
async fn test_mockProvider_shouldEchoTextWithTargetLanguage() {
    let provider = MockProvider::working();
    let response = provider.complete(mock_request("Quarterly results")).await.unwrap();
    let text = MockProvider::extract_text(&response);

    assert!(text.contains("Quarterly results"));
    assert!(text.contains("ja"));
}

#[tokio::test]
async fn test_mockProvider_failTimes_shouldRecoverAfterConfiguredFailures() {
    let provider = MockProvider::fail_times(3);

    for _ in 0..3 {
        let result = provider.complete(mock_request("retry me")).await;
        assert!(matches!(result, Err(ProviderError::ApiError { status_code: 503, .. })));
    }

    assert!(provider.complete(mock_request("retry me")).await.is_ok());
}

#[tokio::test]
async fn test_mockProvider_authFailing_shouldReturnNonRetryableError() {
    let provider = MockProvider::auth_failing();
    let error = provider.complete(mock_request("anything")).await.unwrap_err();

    assert!(matches!(error, ProviderError::AuthenticationError(_)));
    assert!(!error.is_retryable());
}

#[tokio::test]
async fn test_mockProvider_testConnection_shouldReflectBehavior() {
    assert!(MockProvider::working().test_connection().await.is_ok());
    assert!(MockProvider::failing().test_connection().await.is_err());
}

#[test]
fn test_openAIRequest_shouldSerializeMessagesInOrder() {
    let request = OpenAIRequest::new("gpt-4o")
        .add_message("system", "You translate slides")
        .add_message("user", "Translate this")
        .temperature(0.3)
        .max_tokens(512);

    let json = serde_json::to_value(&request).unwrap();

    assert_eq!(json["model"], "gpt-4o");
    assert_eq!(json["messages"][0]["role"], "system");
    assert_eq!(json["messages"][1]["role"], "user");
    assert_eq!(json["temperature"], 0.3);
    assert_eq!(json["max_tokens"], 512);
}

#[test]
fn test_openAIResponse_shouldParseWithoutUsage() {
    let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "translated"}}]}"#;
    let response: OpenAIResponse = serde_json::from_str(raw).unwrap();

    assert_eq!(OpenAI::extract_text(&response), "translated");
    assert!(response.usage.is_none());
}

#[test]
fn test_openAIResponse_shouldHandleEmptyChoices() {
    let raw = r#"{"choices": []}"#;
    let response: OpenAIResponse = serde_json::from_str(raw).unwrap();

    assert_eq!(OpenAI::extract_text(&response), "");
}
