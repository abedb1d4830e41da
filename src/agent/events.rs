// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Progress events emitted while the engine runs
//!
//! Frontends implement [`EngineObserver`] to render live progress. The CLI
//! uses [`JsonLinesObserver`] to print one JSON object per event.

use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::intent::FailureTag;
use crate::error::Result;
use crate::tools::ToolPreview;

/// Ordered progress event: status, tool_start, tool_result, assistant, done
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Status {
        message: String,
    },
    ToolStart {
        turn: usize,
        tool: String,
        args: Value,
    },
    ToolResult {
        turn: usize,
        tool: String,
        ok: bool,
        summary: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preview: Option<ToolPreview>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failure: Option<FailureTag>,
    },
    Assistant {
        text: String,
    },
    Done {
        conversation_id: String,
        answer: String,
        model: String,
        dry_run: bool,
    },
}

impl EngineEvent {
    pub fn status(message: impl Into<String>) -> Self {
        EngineEvent::Status {
            message: message.into(),
        }
    }

    /// Event name as serialized in the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::Status { .. } => "status",
            EngineEvent::ToolStart { .. } => "tool_start",
            EngineEvent::ToolResult { .. } => "tool_result",
            EngineEvent::Assistant { .. } => "assistant",
            EngineEvent::Done { .. } => "done",
        }
    }
}

/// Output hooks for the engine loop
pub trait EngineObserver: Send {
    fn on_event(&mut self, event: &EngineEvent) -> Result<()>;
}

/// Discards every event
#[derive(Debug, Default)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {
    fn on_event(&mut self, _event: &EngineEvent) -> Result<()> {
        Ok(())
    }
}

/// Collects events in memory
impl EngineObserver for Vec<EngineEvent> {
    fn on_event(&mut self, event: &EngineEvent) -> Result<()> {
        self.push(event.clone());
        Ok(())
    }
}

/// Writes each event as one JSON line
pub struct JsonLinesObserver<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> EngineObserver for JsonLinesObserver<W> {
    fn on_event(&mut self, event: &EngineEvent) -> Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
