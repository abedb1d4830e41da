// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

mod common;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitepilot::agent::{ChatRequest, Engine, EngineConfig};
use sitepilot::config::Settings;
use sitepilot::error::{ApiError, PilotError};
use sitepilot::llm::providers::{AnthropicProvider, OpenAIProvider};
use sitepilot::llm::{ChatMessage, ChatProvider, FinishReason, ProviderFactory, TurnRequest};

use common::{Fixture, LOCALE, SITE};

fn turn() -> TurnRequest {
    TurnRequest::new("test-model", vec![ChatMessage::user("Set the title")])
        .with_system("You edit websites.")
        .with_max_tokens(256)
}

#[tokio::test]
async fn test_anthropic_tool_use_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(body_partial_json(json!({"model": "test-model", "system": "You edit websites."})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {"type": "text", "text": "Updating now."},
                {"type": "tool_use", "id": "toolu_1", "name": "update_page_field",
                 "input": {"page": "home", "field_path": "title", "new_value": "Hi"}}
            ],
            "stop_reason": "tool_use"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = AnthropicProvider::with_base_url("test-key", format!("{}/v1/messages", server.uri()));
    let response = provider.run_turn(turn()).await.unwrap();

    assert_eq!(response.assistant_text, "Updating now.");
    assert_eq!(response.finish_reason, FinishReason::ToolUse);
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].id, "toolu_1");
    assert_eq!(response.tool_calls[0].args["new_value"], "Hi");
}

#[tokio::test]
async fn test_anthropic_rate_limit_uses_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "7")
                .set_body_json(json!({"error": {"type": "rate_limit_error", "message": "slow down"}})),
        )
        .mount(&server)
        .await;

    let provider = AnthropicProvider::with_base_url("k", server.uri());
    let err = provider.run_turn(turn()).await.unwrap_err();
    assert!(matches!(err, PilotError::Api(ApiError::RateLimited(7))));
}

#[tokio::test]
async fn test_anthropic_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            json!({"error": {"type": "authentication_error", "message": "invalid x-api-key"}}),
        ))
        .mount(&server)
        .await;

    let provider = AnthropicProvider::with_base_url("bad", server.uri());
    let err = provider.run_turn(turn()).await.unwrap_err();
    assert!(matches!(err, PilotError::Api(ApiError::AuthenticationFailed)));
}

#[tokio::test]
async fn test_openai_tool_call_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "read_page", "arguments": "{\"page\":\"home\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })))
        .mount(&server)
        .await;

    let provider =
        OpenAIProvider::with_base_url("sk-test", format!("{}/v1/chat/completions", server.uri()));
    let response = provider.run_turn(turn()).await.unwrap();

    assert_eq!(response.assistant_text, "");
    assert_eq!(response.finish_reason, FinishReason::ToolUse);
    assert_eq!(response.tool_calls[0].name, "read_page");
    assert_eq!(response.tool_calls[0].args, json!({"page": "home"}));
}

#[tokio::test]
async fn test_openai_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let provider = OpenAIProvider::with_base_url("sk-test", server.uri());
    let err = provider.run_turn(turn()).await.unwrap_err();
    assert!(matches!(err, PilotError::Api(ApiError::ServerError { status: 503, .. })));
}

#[tokio::test]
async fn test_openai_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let provider = OpenAIProvider::with_base_url("sk-test", server.uri());
    let err = provider.run_turn(turn()).await.unwrap_err();
    assert!(matches!(err, PilotError::Api(ApiError::InvalidResponse(_))));
}

#[test]
fn test_factory_requires_api_key() {
    let mut settings = Settings::default();
    settings.providers.anthropic.api_key_env = "SITEPILOT_TEST_UNSET_ANTHROPIC_KEY".to_string();
    settings.providers.anthropic.api_key = None;
    let err = ProviderFactory::create(&settings).err().unwrap();
    assert!(matches!(err, PilotError::Config(_)));

    settings.agent.provider = "carrier-pigeon".to_string();
    assert!(ProviderFactory::create(&settings).is_err());
}

#[test]
fn test_factory_uses_configured_base_url() {
    let mut settings = Settings::default();
    settings.agent.provider = "openai".to_string();
    settings.providers.openai.api_key = Some("sk-test".to_string());
    settings.providers.openai.base_url = Some("http://127.0.0.1:9/v1/chat/completions".to_string());
    let provider = ProviderFactory::create(&settings).unwrap();
    assert_eq!(provider.name(), "openai");
}

#[tokio::test]
async fn test_engine_round_trip_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "tool_use", "id": "toolu_1", "name": "update_page_field",
                         "input": {"page": "home", "field_path": "title", "new_value": "Welcome"}}],
            "stop_reason": "tool_use"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // Served once the tool-use reply is used up
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "Headline updated to Welcome."}],
            "stop_reason": "end_turn"
        })))
        .mount(&server)
        .await;

    let fixture = Fixture::with_docs(&[("pages/home.json", json!({"headline": "Old"}))]).await;
    let provider: Arc<dyn ChatProvider> = Arc::new(AnthropicProvider::with_base_url("k", server.uri()));
    let engine = Engine::new(
        provider,
        fixture.executor(),
        fixture.conversations.clone(),
        EngineConfig::default().with_model("test-model"),
    );

    let response = engine
        .handle(ChatRequest::new(SITE, LOCALE, "Change the home title to Welcome"))
        .await
        .unwrap();

    assert_eq!(response.answer, "Headline updated to Welcome.");
    assert_eq!(fixture.read("pages/home.json").await.unwrap()["headline"], "Welcome");
}
