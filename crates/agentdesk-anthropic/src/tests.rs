// Unit tests for Anthropic driver

use agentdesk_core::llm_drivers::{
    DriverRegistry, LlmCallConfig, LlmDriver, LlmMessage, ProviderConfig,
};
use agentdesk_core::llm_providers::LlmProviderKind;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{register_driver, AnthropicLlmDriver};

fn sse(events: &[(&str, serde_json::Value)]) -> String {
    events
        .iter()
        .map(|(name, data)| format!("event: {}\ndata: {}\n\n", name, data))
        .collect()
}

#[test]
fn test_driver_debug_redacts_key() {
    let driver = AnthropicLlmDriver::new("sk-ant-secret");
    let debug = format!("{:?}", driver);
    assert!(debug.contains("AnthropicLlmDriver"));
    assert!(!debug.contains("sk-ant-secret"));
}

#[test]
fn test_register_driver() {
    let mut registry = DriverRegistry::new();
    assert!(!registry.has_driver(&LlmProviderKind::Anthropic));

    register_driver(&mut registry);

    assert!(registry.has_driver(&LlmProviderKind::Anthropic));
    let config = ProviderConfig::new(LlmProviderKind::Anthropic).with_api_key("test-key");
    assert!(registry.create_driver(&config).is_ok());
}

#[tokio::test]
async fn test_streams_text_with_usage() {
    let server = MockServer::start().await;
    let body = sse(&[
        (
            "message_start",
            json!({"type": "message_start", "message": {"model": "claude-3-haiku-20240307", "usage": {"input_tokens": 12}}}),
        ),
        (
            "content_block_start",
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
        ),
        ("ping", json!({"type": "ping"})),
        (
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Bonjour"}}),
        ),
        (
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": " !"}}),
        ),
        ("content_block_stop", json!({"type": "content_block_stop", "index": 0})),
        (
            "message_delta",
            json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"output_tokens": 3}}),
        ),
        ("message_stop", json!({"type": "message_stop"})),
    ]);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({"system": "Answer in French.", "max_tokens": 4096})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let driver = AnthropicLlmDriver::with_base_url("test-key", server.uri());
    let response = driver
        .chat_completion(
            vec![LlmMessage::system("Answer in French."), LlmMessage::user("Hello")],
            &LlmCallConfig::new("claude-3-haiku-20240307"),
        )
        .await
        .unwrap();

    assert_eq!(response.text, "Bonjour !");
    assert_eq!(response.metadata.prompt_tokens, Some(12));
    assert_eq!(response.metadata.completion_tokens, Some(3));
    assert_eq!(response.metadata.total_tokens, Some(15));
    assert_eq!(response.metadata.finish_reason.as_deref(), Some("end_turn"));
}

#[tokio::test]
async fn test_tool_use_blocks_become_tool_calls() {
    let server = MockServer::start().await;
    let body = sse(&[
        (
            "content_block_start",
            json!({"type": "content_block_start", "index": 0, "content_block": {"type": "tool_use", "id": "toolu_1", "name": "weather", "input": {}}}),
        ),
        (
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": "{\"city\":"}}),
        ),
        (
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "input_json_delta", "partial_json": " \"Paris\"}"}}),
        ),
        ("content_block_stop", json!({"type": "content_block_stop", "index": 0})),
        (
            "message_delta",
            json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}, "usage": {"output_tokens": 20}}),
        ),
        ("message_stop", json!({"type": "message_stop"})),
    ]);

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let driver = AnthropicLlmDriver::with_base_url("test-key", server.uri());
    let response = driver
        .chat_completion(
            vec![LlmMessage::user("Weather in Paris?")],
            &LlmCallConfig::new("claude-3-opus-20240229"),
        )
        .await
        .unwrap();

    let calls = response.tool_calls.expect("tool calls");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "toolu_1");
    assert_eq!(calls[0].name, "weather");
    assert_eq!(calls[0].arguments, json!({"city": "Paris"}));
    assert_eq!(response.metadata.finish_reason.as_deref(), Some("tool_use"));
}

#[tokio::test]
async fn test_stream_error_event_fails_completion() {
    let server = MockServer::start().await;
    let body = sse(&[(
        "error",
        json!({"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}),
    )]);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let driver = AnthropicLlmDriver::with_base_url("test-key", server.uri());
    let result = driver
        .chat_completion(vec![LlmMessage::user("hi")], &LlmCallConfig::new("claude"))
        .await;

    let err = result.err().expect("error expected");
    assert!(err.to_string().contains("Overloaded"));
}

#[tokio::test]
async fn test_usage_total_saturates() {
    let server = MockServer::start().await;
    let body = sse(&[
        (
            "message_start",
            json!({"type": "message_start", "message": {"model": "claude", "usage": {"input_tokens": 4294967295u32}}}),
        ),
        (
            "message_delta",
            json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}, "usage": {"output_tokens": 10}}),
        ),
        ("message_stop", json!({"type": "message_stop"})),
    ]);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let driver = AnthropicLlmDriver::with_base_url("test-key", server.uri());
    let response = driver
        .chat_completion(vec![LlmMessage::user("hi")], &LlmCallConfig::new("claude"))
        .await
        .unwrap();

    assert_eq!(response.metadata.prompt_tokens, Some(u32::MAX));
    assert_eq!(response.metadata.completion_tokens, Some(10));
    assert_eq!(response.metadata.total_tokens, Some(u32::MAX));
}
