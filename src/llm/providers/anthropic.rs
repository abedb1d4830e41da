// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Anthropic Messages API provider
//!
//! Implements the ChatProvider trait for Claude models.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ApiError, PilotError, Result};
use crate::llm::message::{ChatMessage, Role, ToolCall};
use crate::llm::provider::{
    ChatProvider, FinishReason, ToolDefinition, TurnRequest, TurnResponse,
};
use crate::llm::providers::common::{extract_retry_after, send_error};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, ANTHROPIC_API_URL)
    }

    /// Create with a custom base URL
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Bound every request by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }

    /// Convert shared messages to Anthropic format.
    ///
    /// Tool results become `tool_result` blocks in a user turn. History tool
    /// messages with no live call are folded into user text. Consecutive
    /// messages of the same role are merged, as the API requires alternation.
    fn convert_messages(&self, messages: &[ChatMessage]) -> Vec<AnthropicMessage> {
        let mut result: Vec<AnthropicMessage> = Vec::new();

        for m in messages {
            let (role, blocks) = match m.role {
                Role::User => ("user", vec![AnthropicContentBlock::Text {
                    text: m.content.clone(),
                }]),
                Role::Tool if m.is_orphan_tool_result() => ("user", vec![AnthropicContentBlock::Text {
                    text: m.folded_tool_text(),
                }]),
                Role::Tool => (
                    "user",
                    vec![AnthropicContentBlock::ToolResult {
                        tool_use_id: m.tool_call_id.clone().unwrap_or_default(),
                        content: m.content.clone(),
                        is_error: None,
                    }],
                ),
                Role::Assistant => {
                    let mut blocks = Vec::new();
                    if !m.content.is_empty() {
                        blocks.push(AnthropicContentBlock::Text {
                            text: m.content.clone(),
                        });
                    }
                    for call in &m.tool_calls {
                        blocks.push(AnthropicContentBlock::ToolUse {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            input: call.args.clone(),
                        });
                    }
                    ("assistant", blocks)
                }
            };

            if blocks.is_empty() {
                continue;
            }
            match result.last_mut() {
                Some(last) if last.role == role => last.content.extend(blocks),
                _ => result.push(AnthropicMessage {
                    role: role.to_string(),
                    content: blocks,
                }),
            }
        }

        result
    }

    /// Convert tools to Anthropic format
    fn convert_tools(&self, tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.to_json(),
            })
            .collect()
    }

    /// Build the request body
    fn build_request(&self, request: &TurnRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: request.model.clone(),
            messages: self.convert_messages(&request.messages),
            system: if request.system_prompt.is_empty() {
                None
            } else {
                Some(request.system_prompt.clone())
            },
            max_tokens: request.max_tokens,
            temperature: Some(request.temperature),
            tools: if request.tools.is_empty() {
                None
            } else {
                Some(self.convert_tools(&request.tools))
            },
        }
    }

    /// Parse an error response
    fn parse_error(&self, status: u16, body: &str, retry_after: Option<u64>) -> PilotError {
        if let Ok(error_response) = serde_json::from_str::<AnthropicError>(body) {
            match error_response.error.error_type.as_str() {
                "authentication_error" | "permission_error" => {
                    PilotError::Api(ApiError::AuthenticationFailed)
                }
                "rate_limit_error" => {
                    let retry_secs = retry_after.unwrap_or(10) as u32;
                    PilotError::Api(ApiError::RateLimited(retry_secs))
                }
                "not_found_error" => {
                    PilotError::Api(ApiError::ModelNotFound(error_response.error.message))
                }
                "invalid_request_error" => {
                    PilotError::Api(ApiError::InvalidResponse(error_response.error.message))
                }
                _ => PilotError::Api(ApiError::ServerError {
                    status,
                    message: error_response.error.message,
                }),
            }
        } else if status == 401 {
            PilotError::Api(ApiError::AuthenticationFailed)
        } else if status == 429 {
            PilotError::Api(ApiError::RateLimited(retry_after.unwrap_or(10) as u32))
        } else {
            PilotError::Api(ApiError::ServerError {
                status,
                message: body.to_string(),
            })
        }
    }

    /// Convert a response body into the shared turn shape
    fn parse_response(&self, api_response: AnthropicResponse) -> TurnResponse {
        let mut texts = Vec::new();
        let mut tool_calls = Vec::new();

        for block in api_response.content {
            match block {
                AnthropicContentBlock::Text { text } => texts.push(text),
                AnthropicContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall::new(id, name, input))
                }
                AnthropicContentBlock::ToolResult { .. } => {}
            }
        }

        let finish_reason = match api_response.stop_reason.as_deref() {
            Some("tool_use") => FinishReason::ToolUse,
            Some("max_tokens") => FinishReason::Length,
            _ if !tool_calls.is_empty() => FinishReason::ToolUse,
            _ => FinishReason::Stop,
        };

        TurnResponse {
            assistant_text: texts.join("\n"),
            tool_calls,
            finish_reason,
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn run_turn(&self, request: TurnRequest) -> Result<TurnResponse> {
        let body = self.build_request(&request);

        tracing::debug!(
            target: "sitepilot.llm",
            provider = "anthropic",
            model = %request.model,
            messages = body.messages.len(),
            "sending turn"
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status().as_u16();

        if !response.status().is_success() {
            let retry_after = extract_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status, &body, retry_after));
        }

        let api_response: AnthropicResponse = response.json().await.map_err(|e| {
            PilotError::Api(ApiError::InvalidResponse(format!(
                "malformed Anthropic response: {}",
                e
            )))
        })?;

        Ok(self.parse_response(api_response))
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<AnthropicContentBlock>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}
