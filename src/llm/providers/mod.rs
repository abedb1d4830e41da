// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat provider implementations

pub mod anthropic;
mod common;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAIProvider;
