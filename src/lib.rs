// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! sitepilot - conversational content editing for multi-tenant websites.
//!
//! A site owner describes a change in plain language; the engine asks an LLM
//! provider for tool calls, runs them against the site's structured JSON
//! documents, and reports honestly what changed.
//!
//! Architecture highlights:
//! - `agent`: turn loop, call deduplication, context hints, progress events
//! - `content`: field paths, friendly aliases, dual database and file storage
//! - `tools`: content tools, argument validation, access policy, executor
//! - `llm`: provider abstraction and implementations (Anthropic/OpenAI)
//! - `conversation`: persisted message history and site preferences
//! - `config`, `cli`: settings file and command line

pub mod agent;
pub mod cli;
pub mod config;
pub mod content;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod tools;

pub use error::{PilotError, Result};
