// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Provider factory
//!
//! Selects and builds the configured chat provider once at startup.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::error::{PilotError, Result};
use crate::llm::provider::ChatProvider;
use crate::llm::providers::{AnthropicProvider, OpenAIProvider};

/// Factory for creating chat providers
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the provider named by `agent.provider`
    pub fn create(settings: &Settings) -> Result<Arc<dyn ChatProvider>> {
        match settings.agent.provider.as_str() {
            "anthropic" => Self::create_anthropic(settings),
            "openai" => Self::create_openai(settings),
            other => Err(PilotError::Config(format!(
                "Unknown provider '{}'. Expected 'anthropic' or 'openai'.",
                other
            ))),
        }
    }

    /// Create an Anthropic provider
    pub fn create_anthropic(settings: &Settings) -> Result<Arc<dyn ChatProvider>> {
        let api_key = settings.get_anthropic_api_key().ok_or_else(|| {
            PilotError::Config(format!(
                "No Anthropic API key found. Set {} or providers.anthropic.api_key.",
                settings.providers.anthropic.api_key_env
            ))
        })?;

        let provider = match settings.providers.anthropic.base_url {
            Some(ref base_url) => AnthropicProvider::with_base_url(api_key, base_url),
            None => AnthropicProvider::new(api_key),
        };

        Ok(Arc::new(provider.with_timeout(Self::timeout(settings))))
    }

    /// Create an OpenAI-compatible provider
    pub fn create_openai(settings: &Settings) -> Result<Arc<dyn ChatProvider>> {
        let api_key = settings.get_openai_api_key().ok_or_else(|| {
            PilotError::Config(format!(
                "No OpenAI API key found. Set {} or providers.openai.api_key.",
                settings.providers.openai.api_key_env
            ))
        })?;

        let provider = match settings.providers.openai.base_url {
            Some(ref base_url) => OpenAIProvider::with_base_url(api_key, base_url),
            None => OpenAIProvider::new(api_key),
        };

        Ok(Arc::new(provider.with_timeout(Self::timeout(settings))))
    }

    fn timeout(settings: &Settings) -> Duration {
        Duration::from_secs(settings.agent.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_is_config_error() {
        let mut settings = Settings::default();
        settings.agent.provider = "mystery".to_string();
        assert!(matches!(
            ProviderFactory::create(&settings),
            Err(PilotError::Config(_))
        ));
    }

    #[test]
    fn test_anthropic_with_stored_key() {
        let mut settings = Settings::default();
        settings.providers.anthropic.api_key_env = "SITEPILOT_TEST_UNSET_ANTHROPIC".to_string();
        settings.providers.anthropic.api_key = Some("sk-test".to_string());
        let provider = ProviderFactory::create(&settings).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_openai_missing_key() {
        let mut settings = Settings::default();
        settings.agent.provider = "openai".to_string();
        settings.providers.openai.api_key_env = "SITEPILOT_TEST_UNSET_OPENAI".to_string();
        settings.providers.openai.api_key = None;
        assert!(ProviderFactory::create(&settings).is_err());
    }
}
