// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM module for sitepilot
//!
//! Provides one turn-based abstraction over vendor tool-calling APIs.

pub mod factory;
pub mod message;
pub mod mock_provider;
pub mod provider;
pub mod providers;

pub use factory::ProviderFactory;
pub use message::*;
pub use mock_provider::MockProvider;
pub use provider::*;
