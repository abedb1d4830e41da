// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

mod common;

use serde_json::{json, Value};

use sitepilot::agent::{ChatRequest, EngineEvent, FailureTag, NO_CHANGES_APPLIED};
use sitepilot::conversation::{ConversationStore, MessageRole};
use sitepilot::error::{ApiError, PilotError};
use sitepilot::llm::{MockProvider, Role};

use common::{Fixture, LOCALE, SITE};

fn home() -> Value {
    json!({
        "headline": "Old headline",
        "hero": {"image": "/img/hero.jpg"},
        "sections": [{"id": "intro", "type": "hero", "variant": "centered"}]
    })
}

async fn fixture() -> Fixture {
    Fixture::with_docs(&[
        ("pages/home.json", home()),
        ("pages/about.json", json!({"headline": "About us"})),
    ])
    .await
}

fn request(message: &str) -> ChatRequest {
    ChatRequest::new(SITE, LOCALE, message)
}

#[tokio::test]
async fn test_loop_stops_after_four_provider_turns() {
    let fixture = fixture().await;
    let mut provider = MockProvider::new();
    for field in ["headline", "hero", "hero.image", "sections", "sections[0]"] {
        provider = provider.then_tools("", vec![("read_page", json!({"page": "home", "field_path": field}))]);
    }
    let engine = fixture.engine(provider.clone());

    let response = engine.handle(request("What is on the home page?")).await.unwrap();

    assert_eq!(provider.call_count(), 4);
    assert_eq!(response.tool_runs.len(), 4);
    assert!(response.tool_runs.iter().all(|run| run.ok));
    assert!(response
        .tool_runs
        .iter()
        .all(|run| run.args["field_path"] != "sections[0]"));
}

#[tokio::test]
async fn test_identical_calls_execute_once() {
    let fixture = fixture().await;
    let args = json!({"page": "home", "field_path": "title", "new_value": "Welcome"});
    let provider = MockProvider::new()
        .then_tools("", vec![("update_page_field", args.clone()), ("update_page_field", args.clone())])
        .then_tools("", vec![("update_page_field", args.clone())])
        .then_text("unreachable");
    let engine = fixture.engine(provider.clone());

    let response = engine.handle(request("Set the home title to Welcome")).await.unwrap();

    assert_eq!(response.tool_runs.len(), 1);
    // The second turn only repeats a call, so the loop ends there
    assert_eq!(provider.call_count(), 2);

    let second = &provider.requests()[1];
    let tool_messages: Vec<_> = second
        .messages
        .iter()
        .filter(|m| m.role == Role::Tool)
        .collect();
    assert_eq!(tool_messages.len(), 2);
    assert!(tool_messages[1].content.contains("Skipped"));
}

#[tokio::test]
async fn test_same_tool_with_different_args_is_not_duplicate() {
    let fixture = fixture().await;
    let provider = MockProvider::new()
        .then_tools(
            "",
            vec![
                ("update_page_field", json!({"page": "home", "field_path": "title", "new_value": "A"})),
                ("update_page_field", json!({"page": "home", "field_path": "title", "new_value": "B"})),
            ],
        )
        .then_text("Done.");
    let engine = fixture.engine(provider);

    let response = engine.handle(request("Update the home title twice")).await.unwrap();

    assert_eq!(response.tool_runs.len(), 2);
    let stored = fixture.read("pages/home.json").await.unwrap();
    assert_eq!(stored["headline"], "B");
}

#[tokio::test]
async fn test_failed_write_never_claims_success() {
    let fixture = fixture().await;
    let provider = MockProvider::new()
        .then_tools(
            "",
            vec![("set_section_variant", json!({"page": "home", "section": "intro", "variant": "sideways"}))],
        )
        .then_text("Done! The hero now uses the sideways layout.");
    let engine = fixture.engine(provider);

    let response = engine
        .handle(request("Change the hero variant to sideways"))
        .await
        .unwrap();

    assert!(response.answer.starts_with(NO_CHANGES_APPLIED));
    assert!(response.answer.contains("(invalid_variant)"));
    assert!(!response.any_succeeded());
    assert_eq!(response.tool_runs[0].failure, Some(FailureTag::InvalidVariant));

    let stored = fixture.read("pages/home.json").await.unwrap();
    assert_eq!(stored["sections"][0]["variant"], "centered");
}

#[tokio::test]
async fn test_write_intent_without_tool_calls() {
    let fixture = fixture().await;
    let provider = MockProvider::new().then_text("Which page do you mean?");
    let engine = fixture.engine(provider);

    let response = engine.handle(request("Update the headline")).await.unwrap();

    assert!(response.answer.starts_with(NO_CHANGES_APPLIED));
    assert!(response.answer.ends_with("Which page do you mean?"));
}

#[tokio::test]
async fn test_read_only_question_uses_closing_text() {
    let fixture = fixture().await;
    let provider = MockProvider::new()
        .then_tools("", vec![("list_pages", json!({}))])
        .then_text("You have two pages: home and about.");
    let engine = fixture.engine(provider);

    let response = engine.handle(request("Which pages exist?")).await.unwrap();

    assert_eq!(response.answer, "You have two pages: home and about.");
}

#[tokio::test]
async fn test_earlier_preamble_is_not_the_answer() {
    let fixture = fixture().await;
    let provider = MockProvider::new()
        .then_tools(
            "Let me look at the page first.",
            vec![("read_page", json!({"page": "home"}))],
        )
        .then_tools(
            "",
            vec![("update_page_field", json!({"page": "home", "field_path": "title", "new_value": "New"}))],
        )
        .then_text("");
    let engine = fixture.engine(provider);

    let response = engine.handle(request("Update the home title to New")).await.unwrap();

    assert!(!response.answer.contains("Let me look"));
    let lines: Vec<&str> = response.answer.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|line| line.starts_with("- ")));
    assert!(lines[1].contains("headline"));
    assert_eq!(fixture.read("pages/home.json").await.unwrap()["headline"], "New");
}

#[tokio::test]
async fn test_field_path_failure_tagged() {
    let fixture = fixture().await;
    let provider = MockProvider::new()
        .then_tools(
            "",
            vec![("update_page_field", json!({"page": "home", "field_path": "hero..image", "new_value": "x"}))],
        )
        .then_text("");
    let engine = fixture.engine(provider);

    let response = engine.handle(request("Set the hero image")).await.unwrap();

    assert_eq!(response.tool_runs[0].failure, Some(FailureTag::FieldPathError));
    assert!(response.answer.starts_with(NO_CHANGES_APPLIED));
}

#[tokio::test]
async fn test_successful_edit_is_persisted_with_history() {
    let fixture = fixture().await;
    let provider = MockProvider::new()
        .then_tools(
            "",
            vec![("update_page_field", json!({"page": "home", "field_path": "title", "new_value": "Welcome"}))],
        )
        .then_text("The home headline now reads Welcome.");
    let engine = fixture.engine(provider);

    let response = engine
        .handle(request("Change the home page title to Welcome").with_conversation("conv-1"))
        .await
        .unwrap();

    assert_eq!(response.conversation_id, "conv-1");
    assert_eq!(response.answer, "The home headline now reads Welcome.");
    let stored = fixture.read("pages/home.json").await.unwrap();
    assert_eq!(stored["headline"], "Welcome");

    let records = fixture
        .conversations
        .load_conversation(SITE, LOCALE, "conv-1", 20)
        .await
        .unwrap();
    let roles: Vec<MessageRole> = records.iter().map(|r| r.role).collect();
    assert_eq!(roles, vec![MessageRole::User, MessageRole::Tool, MessageRole::Assistant]);
    // Hints reach the provider but are never stored
    assert_eq!(records[0].content, "Change the home page title to Welcome");
    assert_eq!(records[1].tool_name.as_deref(), Some("update_page_field"));
}

#[tokio::test]
async fn test_hints_reach_provider() {
    let fixture = fixture().await;
    let provider = MockProvider::new().then_text("Sure.");
    let engine = fixture.engine(provider.clone());

    engine.handle(request("Tweak the about page")).await.unwrap();

    let first = &provider.requests()[0];
    let user = first.messages.last().unwrap();
    assert_eq!(user.role, Role::User);
    assert!(user.content.starts_with("Tweak the about page"));
    assert!(user.content.contains("[Context]"));
    assert!(user.content.contains("Likely target page: about"));
    assert!(first.system_prompt.contains("Site: s1"));
}

#[tokio::test]
async fn test_follow_up_sees_previous_turns() {
    let fixture = fixture().await;
    let provider = MockProvider::new()
        .then_text("Hello! What would you like to change?")
        .then_text("Noted.");
    let engine = fixture.engine(provider.clone());

    let first = engine.handle(request("Hi there")).await.unwrap();
    engine
        .handle(request("Thanks").with_conversation(&first.conversation_id))
        .await
        .unwrap();

    let second = &provider.requests()[1];
    assert_eq!(second.messages.len(), 3);
    assert_eq!(second.messages[0].content, "Hi there");
    assert_eq!(second.messages[1].role, Role::Assistant);
    assert_eq!(second.messages[1].content, "Hello! What would you like to change?");
}

#[tokio::test]
async fn test_dry_run_persists_nothing() {
    let fixture = fixture().await;
    let provider = MockProvider::new()
        .then_tools(
            "",
            vec![("update_page_field", json!({"page": "home", "field_path": "title", "new_value": "Welcome"}))],
        )
        .then_text("Here is the preview.");
    let engine = fixture.engine(provider.clone());

    let mirror_before = fixture.mirror_snapshot();
    let db_before = fixture.db_snapshot();

    let response = engine
        .handle(request("Change the home title to Welcome").with_dry_run(true))
        .await
        .unwrap();

    assert!(response.dry_run);
    assert!(response.any_succeeded());
    let preview = response.tool_runs[0].preview.as_ref().unwrap();
    assert_eq!(preview.before, json!("Old headline"));
    assert_eq!(preview.after, json!("Welcome"));

    assert_eq!(fixture.mirror_snapshot(), mirror_before);
    assert_eq!(fixture.db_snapshot(), db_before);
    assert_eq!(fixture.conversations.message_count().unwrap(), 0);
    assert!(provider.requests()[0].system_prompt.contains("Dry run"));
}

#[tokio::test]
async fn test_events_in_order() {
    let fixture = fixture().await;
    let provider = MockProvider::new()
        .then_tools("", vec![("read_page", json!({"page": "home"}))])
        .then_text("All good.");
    let engine = fixture.engine(provider);

    let mut events: Vec<EngineEvent> = Vec::new();
    engine
        .handle_with_observer(request("Show the home page"), &mut events)
        .await
        .unwrap();

    let kinds: Vec<&str> = events.iter().map(EngineEvent::kind).collect();
    assert_eq!(kinds, vec!["status", "tool_start", "tool_result", "assistant", "done"]);
    match events.last().unwrap() {
        EngineEvent::Done { answer, model, .. } => {
            assert_eq!(answer, "All good.");
            assert_eq!(model, "mock-model");
        }
        other => panic!("unexpected final event {:?}", other),
    }
}

#[tokio::test]
async fn test_provider_failure_propagates() {
    let fixture = fixture().await;
    let provider = MockProvider::new().then_fail("upstream down");
    let engine = fixture.engine(provider);

    let err = engine.handle(request("Hello")).await.unwrap_err();
    assert!(matches!(err, PilotError::Api(ApiError::ServerError { status: 500, .. })));
}

#[tokio::test]
async fn test_empty_message_rejected() {
    let fixture = fixture().await;
    let engine = fixture.engine(MockProvider::new());

    let err = engine.handle(request("   ")).await.unwrap_err();
    assert!(matches!(err, PilotError::InvalidInput(_)));
}
