// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Request and response types for the engine

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::intent::FailureTag;
use crate::tools::{ToolContext, ToolPreview, ToolResult};

/// One instruction from the surrounding application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub site_id: String,
    pub locale: String,
    pub message: String,
    /// Existing conversation to continue; a new id is minted when absent
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Emit progress events while running
    #[serde(default)]
    pub stream: bool,
    /// Preview only; nothing is persisted
    #[serde(default)]
    pub dry_run: bool,
    /// Actor recorded on content writes
    #[serde(default = "default_actor")]
    pub actor_email: String,
}

fn default_actor() -> String {
    "assistant@sitepilot.local".to_string()
}

impl ChatRequest {
    pub fn new(site_id: impl Into<String>, locale: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            locale: locale.into(),
            message: message.into(),
            conversation_id: None,
            stream: false,
            dry_run: false,
            actor_email: default_actor(),
        }
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_actor(mut self, actor_email: impl Into<String>) -> Self {
        self.actor_email = actor_email.into();
        self
    }

    /// Tool context for this request
    pub fn tool_context(&self) -> ToolContext {
        ToolContext::new(&self.site_id, &self.locale, &self.actor_email).with_dry_run(self.dry_run)
    }
}

/// Record of one attempted tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRun {
    pub tool: String,
    pub args: Value,
    pub ok: bool,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<ToolPreview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureTag>,
}

impl ToolRun {
    pub fn from_result(args: Value, result: &ToolResult) -> Self {
        Self {
            tool: result.tool.clone(),
            args,
            ok: result.ok,
            summary: result.summary.clone(),
            changed_paths: result.changed_paths.clone(),
            preview: result.preview.clone(),
            failure: None,
        }
    }

    pub fn failed(tool: impl Into<String>, args: Value, error: impl Into<String>, tag: FailureTag) -> Self {
        Self {
            tool: tool.into(),
            args,
            ok: false,
            summary: error.into(),
            changed_paths: Vec::new(),
            preview: None,
            failure: Some(tag),
        }
    }
}

/// Final outcome of one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub answer: String,
    pub tool_runs: Vec<ToolRun>,
    pub model: String,
    pub dry_run: bool,
}

impl ChatResponse {
    /// Whether any tool call succeeded
    pub fn any_succeeded(&self) -> bool {
        self.tool_runs.iter().any(|run| run.ok)
    }
}
