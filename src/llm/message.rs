// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Shared message schema
//!
//! Every provider translates these vendor-neutral messages into its own
//! request shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: Role,

    /// Text content
    pub content: String,

    /// Tool calls requested by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Call this tool message answers. Absent for tool results reloaded from
    /// history, which no longer pair with a live call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Tool that produced a tool message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// One tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create an assistant text message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Create an assistant message carrying tool calls
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::assistant(content)
        }
    }

    /// Create a result message for a live tool call
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
            tool_name: Some(tool_name.into()),
        }
    }

    /// Create a tool message restored from persisted history
    pub fn tool_history(tool_name: Option<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name,
        }
    }

    /// Whether this message must be sent to the vendor as plain user text
    pub fn is_orphan_tool_result(&self) -> bool {
        self.role == Role::Tool && self.tool_call_id.is_none()
    }

    /// User-turn text describing a tool result, for vendors or history
    /// entries without a native tool-result pairing
    pub fn folded_tool_text(&self) -> String {
        format!(
            "Tool {} result: {}",
            self.tool_name.as_deref().unwrap_or("unknown"),
            self.content
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message() {
        let msg = ChatMessage::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.tool_calls.is_empty());
    }

    #[test]
    fn test_assistant_with_calls() {
        let call = ToolCall::new("c1", "read_page", json!({"page": "home"}));
        let msg = ChatMessage::assistant_with_calls("", vec![call.clone()]);
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.tool_calls, vec![call]);
    }

    #[test]
    fn test_tool_result_is_paired() {
        let msg = ChatMessage::tool_result("c1", "read_page", "{}");
        assert_eq!(msg.tool_call_id.as_deref(), Some("c1"));
        assert!(!msg.is_orphan_tool_result());
    }

    #[test]
    fn test_history_tool_message_folds() {
        let msg = ChatMessage::tool_history(Some("update_seo".to_string()), "ok");
        assert!(msg.is_orphan_tool_result());
        assert_eq!(msg.folded_tool_text(), "Tool update_seo result: ok");
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), "\"tool\"");
    }
}
