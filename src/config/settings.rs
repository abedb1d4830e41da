// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for sitepilot
//!
//! Handles loading and saving settings from ~/.sitepilot/settings.json

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::content::catalog::CatalogConfig;

mod io;
mod validation;

/// Main settings structure, stored in ~/.sitepilot/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// LLM provider configurations
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Content persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Media URL and library settings
    #[serde(default)]
    pub media: MediaConfig,

    /// Addressable content kinds
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Configuration for LLM providers
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    /// Anthropic Claude configuration
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// OpenAI (or OpenAI-compatible) configuration
    #[serde(default)]
    pub openai: OpenAIConfig,
}

/// Anthropic-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// API key (if stored directly, not recommended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name for API key
    #[serde(default = "default_anthropic_api_key_env")]
    pub api_key_env: String,

    /// Default model to use
    #[serde(default = "default_anthropic_model")]
    pub default_model: String,

    /// Base URL for API (for custom endpoints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// OpenAI-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// API key (if stored directly, not recommended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name for API key
    #[serde(default = "default_openai_api_key_env")]
    pub api_key_env: String,

    /// Default model to use
    #[serde(default = "default_openai_model")]
    pub default_model: String,

    /// Base URL for API (for OpenAI-compatible gateways)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_anthropic_api_key_env(),
            default_model: default_anthropic_model(),
            base_url: None,
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_openai_api_key_env(),
            default_model: default_openai_model(),
            base_url: None,
        }
    }
}

/// Agent loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Provider to use ("anthropic" or "openai")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model override (falls back to the provider's default model)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Hard cap on provider turns per request
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,

    /// Number of prior messages loaded into history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum tokens for a provider response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Provider HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// System prompt override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            max_turns: default_max_turns(),
            history_limit: default_history_limit(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            system_prompt: None,
        }
    }
}

/// Content persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file; `None` runs in file-only mode
    #[serde(default = "default_database_path")]
    pub database_path: Option<PathBuf>,

    /// Root directory of the JSON file mirror
    #[serde(default = "default_mirror_root")]
    pub mirror_root: PathBuf,

    /// Deployment environment ("development", "staging", "production")
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Explicit write-through toggle for the file mirror
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_through_files: Option<bool>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            mirror_root: default_mirror_root(),
            environment: default_environment(),
            write_through_files: None,
        }
    }
}

impl StorageConfig {
    /// Whether DB writes are mirrored to files; on by default outside production
    pub fn write_through_enabled(&self) -> bool {
        self.write_through_files
            .unwrap_or_else(|| !self.environment.eq_ignore_ascii_case("production"))
    }
}

/// Media configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Public base URL of the media host; matching URLs are stored root-relative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,

    /// Logical document that lists the site's media assets
    #[serde(default = "default_media_library_path")]
    pub library_path: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            public_base_url: None,
            library_path: default_media_library_path(),
        }
    }
}

// Default value functions
fn default_anthropic_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_openai_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_max_turns() -> usize {
    4
}

fn default_history_limit() -> usize {
    20
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.2
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_database_path() -> Option<PathBuf> {
    Some(Settings::sitepilot_home().join("content.db"))
}

fn default_mirror_root() -> PathBuf {
    Settings::sitepilot_home().join("content")
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_media_library_path() -> String {
    "media/library.json".to_string()
}
