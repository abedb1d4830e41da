// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! The turn loop
//!
//! One request runs sequentially: load history, add context hints, then ask
//! the provider for up to `max_turns` turns, executing each novel tool call
//! in order and feeding its result back before the next turn. Tool failures
//! never abort the loop; provider failures do.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::agent::events::{EngineEvent, EngineObserver, NoopObserver};
use crate::agent::hints::{build_context_hints, with_hints};
use crate::agent::intent::{is_write_intent, FailureTag};
use crate::agent::tracker::ToolCallTracker;
use crate::agent::types::{ChatRequest, ChatResponse, ToolRun};
use crate::config::Settings;
use crate::conversation::{ChatMessageRecord, ConversationStore, MessageRole};
use crate::error::{PilotError, Result};
use crate::llm::message::{ChatMessage, ToolCall};
use crate::llm::provider::{ChatProvider, TurnRequest};
use crate::tools::{ToolContext, ToolExecutor};

/// Opening of every answer where a write was asked for and nothing succeeded
pub const NO_CHANGES_APPLIED: &str = "No changes were applied.";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a website content assistant. \
You read and edit the site's structured content (pages, collection entries such as agents, \
listings, testimonials and FAQs, and site settings) only through the provided tools. \
Read a page or entity before editing it when unsure of its field names. \
Never claim a change was made unless a tool call reported success. \
Only delete an entity after the user has explicitly confirmed, and then pass confirm=true. \
Keep answers short and say exactly what changed.";

/// Engine tuning, taken from the `agent` settings section
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model: String,
    pub max_turns: usize,
    pub history_limit: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_turns: 4,
            history_limit: 20,
            max_tokens: 4096,
            temperature: 0.2,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model: settings.effective_model(),
            max_turns: settings.agent.max_turns.max(1),
            history_limit: settings.agent.history_limit,
            max_tokens: settings.agent.max_tokens,
            temperature: settings.agent.temperature,
            system_prompt: settings
                .agent
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }
}

/// Conversational content-mutation engine
pub struct Engine {
    provider: Arc<dyn ChatProvider>,
    executor: ToolExecutor,
    conversations: Arc<dyn ConversationStore>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        executor: ToolExecutor,
        conversations: Arc<dyn ConversationStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            executor,
            conversations,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Run one request without progress events
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.handle_with_observer(request, &mut NoopObserver).await
    }

    /// Run one request, reporting progress to `observer`
    pub async fn handle_with_observer(
        &self,
        request: ChatRequest,
        observer: &mut dyn EngineObserver,
    ) -> Result<ChatResponse> {
        if request.message.trim().is_empty() {
            return Err(PilotError::InvalidInput("message must not be empty".to_string()));
        }

        let conversation_id = request
            .conversation_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let ctx = request.tool_context();

        tracing::info!(
            target: "sitepilot.agent.engine",
            site = %ctx.site_id,
            locale = %ctx.locale,
            conversation = %conversation_id,
            dry_run = ctx.dry_run,
            model = %self.config.model,
            "request start"
        );
        observer.on_event(&EngineEvent::status("Loading conversation"))?;

        let mut messages = self.load_history(&ctx, &conversation_id).await?;
        let hints = build_context_hints(self.executor.services(), &ctx, &request.message).await;
        messages.push(ChatMessage::user(with_hints(&request.message, hints.as_deref())));

        self.persist(
            &ctx,
            &conversation_id,
            ChatMessageRecord::new(MessageRole::User, &request.message),
        )
        .await?;

        let outcome = self.run_loop(&ctx, &conversation_id, messages, observer).await?;
        let write_intent = is_write_intent(&request.message);
        let answer = select_answer(write_intent, &outcome.runs, outcome.closing_text.as_deref());

        self.persist(
            &ctx,
            &conversation_id,
            ChatMessageRecord::new(MessageRole::Assistant, &answer),
        )
        .await?;

        tracing::info!(
            target: "sitepilot.agent.engine",
            conversation = %conversation_id,
            turns = outcome.turns,
            tool_runs = outcome.runs.len(),
            succeeded = outcome.runs.iter().filter(|r| r.ok).count(),
            write_intent,
            "request complete"
        );

        observer.on_event(&EngineEvent::Done {
            conversation_id: conversation_id.clone(),
            answer: answer.clone(),
            model: self.config.model.clone(),
            dry_run: ctx.dry_run,
        })?;

        Ok(ChatResponse {
            conversation_id,
            answer,
            tool_runs: outcome.runs,
            model: self.config.model.clone(),
            dry_run: ctx.dry_run,
        })
    }

    async fn load_history(&self, ctx: &ToolContext, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        let records = self
            .conversations
            .load_conversation(
                &ctx.site_id,
                &ctx.locale,
                conversation_id,
                self.config.history_limit,
            )
            .await?;

        Ok(records
            .into_iter()
            .map(|record| match record.role {
                MessageRole::User => ChatMessage::user(record.content),
                MessageRole::Assistant => ChatMessage::assistant(record.content),
                MessageRole::Tool => ChatMessage::tool_history(record.tool_name, record.content),
            })
            .collect())
    }

    /// Append to the conversation log; dry-run requests persist nothing
    async fn persist(
        &self,
        ctx: &ToolContext,
        conversation_id: &str,
        record: ChatMessageRecord,
    ) -> Result<()> {
        if ctx.dry_run {
            return Ok(());
        }
        self.conversations
            .save_message(&ctx.site_id, &ctx.locale, conversation_id, &record)
            .await
    }

    fn system_prompt(&self, ctx: &ToolContext) -> String {
        let mut prompt = format!(
            "{}\n\nSite: {}\nLocale: {}",
            self.config.system_prompt, ctx.site_id, ctx.locale
        );
        if ctx.dry_run {
            prompt.push_str("\nDry run: tool calls preview changes but nothing is saved.");
        }
        prompt
    }

    async fn run_loop(
        &self,
        ctx: &ToolContext,
        conversation_id: &str,
        mut messages: Vec<ChatMessage>,
        observer: &mut dyn EngineObserver,
    ) -> Result<LoopOutcome> {
        let mut tracker = ToolCallTracker::new();
        let mut outcome = LoopOutcome::default();
        let system_prompt = self.system_prompt(ctx);
        let tools = self.executor.tool_definitions();
        let mut finished = false;

        while outcome.turns < self.config.max_turns {
            outcome.turns += 1;
            let turn = outcome.turns;

            tracing::debug!(
                target: "sitepilot.agent.engine",
                turn,
                messages = messages.len(),
                "requesting provider turn"
            );

            let request = TurnRequest::new(&self.config.model, messages.clone())
                .with_system(&system_prompt)
                .with_tools(tools.clone())
                .with_max_tokens(self.config.max_tokens)
                .with_temperature(self.config.temperature);
            let response = self.provider.run_turn(request).await?;

            let text = response.assistant_text.trim().to_string();
            if !text.is_empty() {
                observer.on_event(&EngineEvent::Assistant { text: text.clone() })?;
            }
            // Only the text of the turn that ends the loop counts as its answer
            outcome.closing_text = (!text.is_empty()).then(|| text.clone());

            if response.tool_calls.is_empty() {
                tracing::debug!(
                    target: "sitepilot.agent.engine",
                    turn,
                    finish_reason = ?response.finish_reason,
                    "turn completed without tool calls"
                );
                finished = true;
                break;
            }

            messages.push(ChatMessage::assistant_with_calls(
                text,
                response.tool_calls.clone(),
            ));

            let mut novel = 0;
            for call in &response.tool_calls {
                if !tracker.track(&call.name, &call.args) {
                    tracing::info!(
                        target: "sitepilot.agent.engine",
                        turn,
                        tool_name = %call.name,
                        "skipping duplicate tool call"
                    );
                    messages.push(ChatMessage::tool_result(
                        &call.id,
                        &call.name,
                        json!({
                            "ok": false,
                            "tool": call.name,
                            "summary": "Skipped: identical call already executed in this request",
                        })
                        .to_string(),
                    ));
                    continue;
                }
                novel += 1;

                let (run, content) = self.execute_call(ctx, turn, call, observer).await?;
                self.persist(
                    ctx,
                    conversation_id,
                    ChatMessageRecord::new(MessageRole::Tool, &content).with_tool_name(&call.name),
                )
                .await?;
                messages.push(ChatMessage::tool_result(&call.id, &call.name, content));
                outcome.runs.push(run);
            }

            if novel == 0 {
                observer.on_event(&EngineEvent::status(
                    "All requested tool calls were already executed; stopping",
                ))?;
                finished = true;
                break;
            }
        }

        if !finished {
            tracing::info!(
                target: "sitepilot.agent.engine",
                max_turns = self.config.max_turns,
                "turn limit reached"
            );
        }

        Ok(outcome)
    }

    /// Execute one call; failures become a failed run, never an error
    async fn execute_call(
        &self,
        ctx: &ToolContext,
        turn: usize,
        call: &ToolCall,
        observer: &mut dyn EngineObserver,
    ) -> Result<(ToolRun, String)> {
        observer.on_event(&EngineEvent::ToolStart {
            turn,
            tool: call.name.clone(),
            args: call.args.clone(),
        })?;

        let (run, content) = match self.executor.execute(ctx, &call.name, &call.args).await {
            Ok(result) => {
                let content = result.to_message_content();
                (ToolRun::from_result(call.args.clone(), &result), content)
            }
            Err(e) => {
                let error = e.to_string();
                let tag = FailureTag::classify(&error, &call.args);
                tracing::warn!(
                    target: "sitepilot.agent.engine",
                    turn,
                    tool_name = %call.name,
                    failure = %tag,
                    error = %error,
                    "tool call failed"
                );
                let content = json!({
                    "ok": false,
                    "tool": call.name,
                    "error": error,
                    "failure": tag,
                })
                .to_string();
                (ToolRun::failed(&call.name, call.args.clone(), error, tag), content)
            }
        };

        observer.on_event(&EngineEvent::ToolResult {
            turn,
            tool: run.tool.clone(),
            ok: run.ok,
            summary: run.summary.clone(),
            preview: run.preview.clone(),
            failure: run.failure,
        })?;

        Ok((run, content))
    }
}

#[derive(Debug, Default)]
struct LoopOutcome {
    turns: usize,
    runs: Vec<ToolRun>,
    closing_text: Option<String>,
}

/// Final answer text
///
/// A write request with no successful tool call always says nothing was
/// applied. Otherwise the provider's closing text wins, then a bullet list
/// of tool summaries.
pub fn select_answer(write_intent: bool, runs: &[ToolRun], closing_text: Option<&str>) -> String {
    let any_ok = runs.iter().any(|run| run.ok);

    if write_intent && !any_ok {
        let mut answer = NO_CHANGES_APPLIED.to_string();
        let failures: Vec<String> = runs
            .iter()
            .map(|run| match run.failure {
                Some(tag) => format!("- {}: {} ({})", run.tool, run.summary, tag),
                None => format!("- {}: {}", run.tool, run.summary),
            })
            .collect();
        if !failures.is_empty() {
            answer.push_str("\n\n");
            answer.push_str(&failures.join("\n"));
        }
        if let Some(text) = closing_text.filter(|t| !t.trim().is_empty()) {
            answer.push_str("\n\n");
            answer.push_str(text);
        }
        return answer;
    }

    if let Some(text) = closing_text.filter(|t| !t.trim().is_empty()) {
        return text.to_string();
    }

    if !runs.is_empty() {
        return runs
            .iter()
            .map(|run| format!("- {}", run.summary))
            .collect::<Vec<_>>()
            .join("\n");
    }

    "I don't have anything to report for that request.".to_string()
}
