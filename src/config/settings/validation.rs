// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::content::catalog::is_valid_table_name;
use crate::error::{PilotError, Result};

use super::Settings;

impl Settings {
    /// Get the API key for Anthropic, checking env var first.
    pub fn get_anthropic_api_key(&self) -> Option<String> {
        // Priority: env var > config file.
        std::env::var(&self.providers.anthropic.api_key_env)
            .ok()
            .or_else(|| self.providers.anthropic.api_key.clone())
    }

    /// Get the API key for OpenAI, checking env var first.
    pub fn get_openai_api_key(&self) -> Option<String> {
        // Priority: env var > config file.
        std::env::var(&self.providers.openai.api_key_env)
            .ok()
            .or_else(|| self.providers.openai.api_key.clone())
    }

    /// Check if the given provider has a usable configuration.
    pub fn is_provider_configured(&self, provider: &str) -> bool {
        match provider {
            "anthropic" => self.get_anthropic_api_key().is_some(),
            "openai" => self.get_openai_api_key().is_some(),
            _ => false,
        }
    }

    /// Model used by the agent: explicit override, else the provider default.
    pub fn effective_model(&self) -> String {
        if let Some(model) = &self.agent.model {
            return model.clone();
        }
        match self.agent.provider.as_str() {
            "openai" => self.providers.openai.default_model.clone(),
            _ => self.providers.anthropic.default_model.clone(),
        }
    }

    /// Validate values that cannot be expressed through serde defaults.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.agent.provider.as_str(), "anthropic" | "openai") {
            return Err(PilotError::Config(format!(
                "Unknown provider '{}' (expected 'anthropic' or 'openai')",
                self.agent.provider
            )));
        }
        if self.agent.max_turns == 0 {
            return Err(PilotError::Config(
                "agent.max_turns must be at least 1".to_string(),
            ));
        }
        for table in self.catalog.dedicated_tables() {
            if !is_valid_table_name(table) {
                return Err(PilotError::Config(format!(
                    "Invalid dedicated table name '{}'",
                    table
                )));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for collection in &self.catalog.collections {
            if !seen.insert(collection.name.as_str()) {
                return Err(PilotError::Config(format!(
                    "Duplicate collection '{}'",
                    collection.name
                )));
            }
        }
        Ok(())
    }
}
