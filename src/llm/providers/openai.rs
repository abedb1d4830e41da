// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! OpenAI Chat Completions provider
//!
//! Works with any OpenAI-compatible endpoint that supports function tools.

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

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, OPENAI_API_URL)
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

    /// Convert shared messages to OpenAI format
    fn convert_messages(&self, messages: &[ChatMessage], system: &str) -> Vec<OpenAIMessage> {
        let mut result = Vec::with_capacity(messages.len() + 1);

        if !system.is_empty() {
            result.push(OpenAIMessage::text("system", system));
        }

        for m in messages {
            match m.role {
                Role::User => result.push(OpenAIMessage::text("user", &m.content)),
                Role::Tool if m.is_orphan_tool_result() => {
                    result.push(OpenAIMessage::text("user", &m.folded_tool_text()))
                }
                Role::Tool => result.push(OpenAIMessage {
                    role: "tool".to_string(),
                    content: Some(m.content.clone()),
                    tool_calls: None,
                    tool_call_id: m.tool_call_id.clone(),
                }),
                Role::Assistant => {
                    let tool_calls: Vec<OpenAIToolCall> = m
                        .tool_calls
                        .iter()
                        .map(|call| OpenAIToolCall {
                            id: call.id.clone(),
                            r#type: "function".to_string(),
                            function: OpenAIFunctionCall {
                                name: call.name.clone(),
                                arguments: call.args.to_string(),
                            },
                        })
                        .collect();
                    result.push(OpenAIMessage {
                        role: "assistant".to_string(),
                        content: if m.content.is_empty() && !tool_calls.is_empty() {
                            None
                        } else {
                            Some(m.content.clone())
                        },
                        tool_calls: if tool_calls.is_empty() {
                            None
                        } else {
                            Some(tool_calls)
                        },
                        tool_call_id: None,
                    });
                }
            }
        }

        result
    }

    /// Convert tools to OpenAI function format
    fn convert_tools(&self, tools: &[ToolDefinition]) -> Vec<OpenAITool> {
        tools
            .iter()
            .map(|t| OpenAITool {
                r#type: "function".to_string(),
                function: OpenAIFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.to_json(),
                },
            })
            .collect()
    }

    /// Build the request body
    fn build_request(&self, request: &TurnRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: request.model.clone(),
            messages: self.convert_messages(&request.messages, &request.system_prompt),
            max_tokens: Some(request.max_tokens),
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
        if let Ok(error_response) = serde_json::from_str::<OpenAIError>(body) {
            let message = error_response.error.message;
            let code = error_response
                .error
                .code
                .or(error_response.error.error_type)
                .unwrap_or_default();

            match code.as_str() {
                "invalid_api_key" | "authentication_error" => {
                    PilotError::Api(ApiError::AuthenticationFailed)
                }
                "rate_limit_exceeded" => {
                    PilotError::Api(ApiError::RateLimited(retry_after.unwrap_or(60) as u32))
                }
                "model_not_found" => PilotError::Api(ApiError::ModelNotFound(message)),
                _ if status == 401 => PilotError::Api(ApiError::AuthenticationFailed),
                _ if status == 429 => {
                    PilotError::Api(ApiError::RateLimited(retry_after.unwrap_or(60) as u32))
                }
                _ => PilotError::Api(ApiError::ServerError { status, message }),
            }
        } else {
            PilotError::Api(ApiError::ServerError {
                status,
                message: body.to_string(),
            })
        }
    }

    /// Convert a response body into the shared turn shape
    fn parse_response(&self, api_response: OpenAIResponse) -> Result<TurnResponse> {
        let choice = api_response.choices.into_iter().next().ok_or_else(|| {
            PilotError::Api(ApiError::InvalidResponse(
                "No choices in response".to_string(),
            ))
        })?;

        let mut tool_calls = Vec::new();
        for tc in choice.message.tool_calls.unwrap_or_default() {
            let args = if tc.function.arguments.trim().is_empty() {
                serde_json::json!({})
            } else {
                serde_json::from_str(&tc.function.arguments).map_err(|e| {
                    PilotError::Api(ApiError::InvalidResponse(format!(
                        "malformed arguments for tool call '{}': {}",
                        tc.function.name, e
                    )))
                })?
            };
            tool_calls.push(ToolCall::new(tc.id, tc.function.name, args));
        }

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("tool_calls") | Some("function_call") => FinishReason::ToolUse,
            Some("length") => FinishReason::Length,
            _ if !tool_calls.is_empty() => FinishReason::ToolUse,
            _ => FinishReason::Stop,
        };

        Ok(TurnResponse {
            assistant_text: choice.message.content.unwrap_or_default(),
            tool_calls,
            finish_reason,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn run_turn(&self, request: TurnRequest) -> Result<TurnResponse> {
        let body = self.build_request(&request);

        tracing::debug!(
            target: "sitepilot.llm",
            provider = "openai",
            model = %request.model,
            messages = body.messages.len(),
            "sending turn"
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .header("Content-Type", "application/json")
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

        let api_response: OpenAIResponse = response.json().await.map_err(|e| {
            PilotError::Api(ApiError::InvalidResponse(format!(
                "malformed OpenAI response: {}",
                e
            )))
        })?;

        self.parse_response(api_response)
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "default_call_type")]
    r#type: String,
    function: OpenAIFunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    r#type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    error: OpenAIErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetail {
    message: String,
    code: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
}
