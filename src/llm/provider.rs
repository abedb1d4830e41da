// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat provider trait and related types
//!
//! Defines the abstraction layer over vendor tool-calling APIs. A provider
//! runs exactly one conversational turn per call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::llm::message::{ChatMessage, ToolCall};

/// Main trait for chat providers
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Get the provider name (e.g., "anthropic", "openai")
    fn name(&self) -> &str;

    /// Run one turn: send the conversation, return text and tool calls
    async fn run_turn(&self, request: TurnRequest) -> Result<TurnResponse>;
}

/// Request for a single turn
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: String,

    /// Tools available for the model to use
    pub tools: Vec<ToolDefinition>,

    /// Conversation so far
    pub messages: Vec<ChatMessage>,

    /// Maximum tokens in response
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

/// Result of a single turn
#[derive(Debug, Clone, Default)]
pub struct TurnResponse {
    /// Assistant text, possibly empty
    pub assistant_text: String,

    /// Tool calls requested, in the order returned
    pub tool_calls: Vec<ToolCall>,

    /// Normalized stop reason
    pub finish_reason: FinishReason,
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of message
    #[default]
    Stop,
    /// Wants to use a tool
    ToolUse,
    /// Hit max tokens
    Length,
}

/// Tool definition for the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// Input schema (JSON Schema)
    pub input_schema: ToolInputSchema,
}

/// Input schema for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    /// Schema type (always "object")
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Property definitions
    pub properties: serde_json::Value,

    /// Required properties
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolInputSchema {
    /// JSON Schema object as sent to vendors
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": self.schema_type,
            "properties": self.properties,
            "required": self.required,
        })
    }
}

impl TurnRequest {
    /// Create a new turn request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            system_prompt: String::new(),
            tools: vec![],
            messages,
            max_tokens: 4096,
            temperature: 0.2,
        }
    }

    /// Set the system prompt
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = system.into();
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl TurnResponse {
    /// Plain text reply with no tool calls
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            assistant_text: text.into(),
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
        }
    }

    /// Reply requesting tool calls
    pub fn tools(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            assistant_text: text.into(),
            tool_calls,
            finish_reason: FinishReason::ToolUse,
        }
    }

    /// Whether the model asked for any tool
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turn_request_builder() {
        let request = TurnRequest::new("m", vec![ChatMessage::user("hi")])
            .with_system("sys")
            .with_max_tokens(100)
            .with_temperature(0.0);
        assert_eq!(request.model, "m");
        assert_eq!(request.system_prompt, "sys");
        assert_eq!(request.max_tokens, 100);
        assert_eq!(request.messages.len(), 1);
        assert!(request.tools.is_empty());
    }

    #[test]
    fn test_turn_response_helpers() {
        assert!(!TurnResponse::text("done").has_tool_calls());
        let response = TurnResponse::tools("", vec![ToolCall::new("1", "list_pages", json!({}))]);
        assert!(response.has_tool_calls());
        assert_eq!(response.finish_reason, FinishReason::ToolUse);
    }

    #[test]
    fn test_finish_reason_serialization() {
        assert_eq!(
            serde_json::to_string(&FinishReason::ToolUse).unwrap(),
            "\"tool_use\""
        );
    }

    #[test]
    fn test_schema_to_json() {
        let schema = ToolInputSchema {
            schema_type: "object".to_string(),
            properties: json!({"page": {"type": "string"}}),
            required: vec!["page".to_string()],
        };
        let value = schema.to_json();
        assert_eq!(value["type"], "object");
        assert_eq!(value["required"], json!(["page"]));
    }
}
