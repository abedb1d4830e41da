// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Conversational engine: turn loop, context hints, failure tagging and
//! progress events

pub mod engine;
pub mod events;
pub mod hints;
pub mod intent;
pub mod tracker;
pub mod types;

pub use engine::{select_answer, Engine, EngineConfig, NO_CHANGES_APPLIED};
pub use events::{EngineEvent, EngineObserver, JsonLinesObserver, NoopObserver};
pub use hints::{build_context_hints, detect_target_page, with_hints};
pub use intent::{is_write_intent, FailureTag};
pub use tracker::ToolCallTracker;
pub use types::{ChatRequest, ChatResponse, ToolRun};
