// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Mock chat provider for testing
//!
//! Returns scripted turns in order and records every request, so engine
//! behaviour can be tested without real API calls.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ApiError, PilotError, Result};
use crate::llm::message::ToolCall;
use crate::llm::provider::{ChatProvider, TurnRequest, TurnResponse};

/// A scripted provider for tests
#[derive(Clone)]
pub struct MockProvider {
    name: String,
    script: Arc<Mutex<VecDeque<ScriptedTurn>>>,
    /// Turn returned once the script is exhausted
    fallback: Option<TurnResponse>,
    call_count: Arc<AtomicUsize>,
    recorded_requests: Arc<Mutex<Vec<TurnRequest>>>,
}

#[derive(Clone)]
enum ScriptedTurn {
    Reply(TurnResponse),
    Fail(String),
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Mock provider lock was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl MockProvider {
    /// Create a provider that answers with empty text
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            recorded_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a turn
    pub fn then(self, response: TurnResponse) -> Self {
        lock(&self.script).push_back(ScriptedTurn::Reply(response));
        self
    }

    /// Queue a plain text reply
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then(TurnResponse::text(text))
    }

    /// Queue a turn requesting tool calls, given as (name, args) pairs
    pub fn then_tools(self, text: impl Into<String>, calls: Vec<(&str, serde_json::Value)>) -> Self {
        let turn = self.call_count.load(Ordering::SeqCst) + lock(&self.script).len();
        let calls = calls
            .into_iter()
            .enumerate()
            .map(|(i, (name, args))| ToolCall::new(format!("call_{}_{}", turn, i), name, args))
            .collect();
        self.then(TurnResponse::tools(text, calls))
    }

    /// Queue a provider failure
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        lock(&self.script).push_back(ScriptedTurn::Fail(message.into()));
        self
    }

    /// Keep returning `response` once the script runs out
    pub fn repeating(mut self, response: TurnResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    /// Number of turns requested so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request received, in order
    pub fn requests(&self) -> Vec<TurnRequest> {
        lock(&self.recorded_requests).clone()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run_turn(&self, request: TurnRequest) -> Result<TurnResponse> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        lock(&self.recorded_requests).push(request);

        let next = lock(&self.script).pop_front();
        match next {
            Some(ScriptedTurn::Reply(response)) => Ok(response),
            Some(ScriptedTurn::Fail(message)) => Err(PilotError::Api(ApiError::ServerError {
                status: 500,
                message,
            })),
            None => Ok(self
                .fallback
                .clone()
                .unwrap_or_else(|| TurnResponse::text(""))),
        }
    }
}
