// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Persisted conversation history and per-site preferences

pub mod preferences;
pub mod store;

pub use preferences::{Preference, PreferenceStore, SqlitePreferenceStore};
pub use store::{ChatMessageRecord, ConversationStore, MessageRole, SqliteConversationStore};
