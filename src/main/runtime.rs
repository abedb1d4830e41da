// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::sync::Arc;

use sitepilot::agent::{Engine, EngineConfig};
use sitepilot::config::Settings;
use sitepilot::content::{ContentStore, DocumentMediaLibrary, DualContentStore};
use sitepilot::conversation::{SqliteConversationStore, SqlitePreferenceStore};
use sitepilot::error::Result;
use sitepilot::llm::factory::ProviderFactory;
use sitepilot::tools::{ToolExecutor, ToolRegistry, ToolServices};

/// Opened stores shared by every subcommand
pub(super) struct Runtime {
    pub settings: Settings,
    pub content: Arc<DualContentStore>,
    pub conversations: Arc<SqliteConversationStore>,
    pub preferences: Arc<SqlitePreferenceStore>,
}

impl Runtime {
    pub fn open(settings: Settings) -> Result<Self> {
        settings.ensure_directories()?;

        let content = Arc::new(DualContentStore::from_settings(&settings)?);
        let state_db = settings.state_database_path();
        let conversations = Arc::new(SqliteConversationStore::open(&state_db)?);
        let preferences = Arc::new(SqlitePreferenceStore::open(&state_db)?);

        tracing::debug!(
            target: "sitepilot.cli",
            state_db = %state_db.display(),
            mirror_root = %settings.storage.mirror_root.display(),
            write_through = settings.storage.write_through_enabled(),
            "runtime opened"
        );

        Ok(Self {
            settings,
            content,
            conversations,
            preferences,
        })
    }

    /// Build the engine with the configured provider
    pub fn engine(&self) -> Result<Engine> {
        let content: Arc<dyn ContentStore> = self.content.clone();
        let media = Arc::new(DocumentMediaLibrary::new(
            content.clone(),
            self.settings.media.library_path.clone(),
        ));
        let services = ToolServices::new(
            content,
            self.preferences.clone(),
            media,
            self.settings.catalog.clone(),
        );
        let executor = ToolExecutor::new(ToolRegistry::with_builtins(), services);
        let provider = ProviderFactory::create(&self.settings)?;

        Ok(Engine::new(
            provider,
            executor,
            self.conversations.clone(),
            EngineConfig::from_settings(&self.settings),
        ))
    }
}
