// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::Value;
use tempfile::TempDir;

use sitepilot::agent::{Engine, EngineConfig};
use sitepilot::content::{
    CatalogConfig, ContentStore, DocumentMediaLibrary, DualContentStore, FileMirror,
    SqliteDocuments,
};
use sitepilot::conversation::{SqliteConversationStore, SqlitePreferenceStore};
use sitepilot::llm::MockProvider;
use sitepilot::tools::{ToolContext, ToolExecutor, ToolRegistry, ToolServices};

pub const SITE: &str = "s1";
pub const LOCALE: &str = "en";

pub fn ctx() -> ToolContext {
    ToolContext::new(SITE, LOCALE, "editor@example.com")
}

/// Content store over an in-memory database and a temporary file mirror
pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<DualContentStore>,
    pub preferences: Arc<SqlitePreferenceStore>,
    pub conversations: Arc<SqliteConversationStore>,
}

impl Fixture {
    pub async fn with_docs(docs: &[(&str, Value)]) -> Self {
        let dir = TempDir::new().unwrap();
        let catalog = CatalogConfig::default();
        let db = SqliteDocuments::in_memory(&catalog.dedicated_tables()).unwrap();
        let store = Arc::new(DualContentStore::new(
            Some(db),
            FileMirror::new(dir.path()),
            catalog,
        ));
        for (path, doc) in docs {
            store.write(&ctx(), path, doc.clone()).await.unwrap();
        }
        Self {
            dir,
            store,
            preferences: Arc::new(SqlitePreferenceStore::in_memory().unwrap()),
            conversations: Arc::new(SqliteConversationStore::in_memory().unwrap()),
        }
    }

    pub fn services(&self) -> ToolServices {
        let content: Arc<dyn ContentStore> = self.store.clone();
        ToolServices::new(
            content.clone(),
            self.preferences.clone(),
            Arc::new(DocumentMediaLibrary::new(content, "media/library.json")),
            CatalogConfig::default(),
        )
    }

    pub fn executor(&self) -> ToolExecutor {
        ToolExecutor::new(ToolRegistry::with_builtins(), self.services())
    }

    pub fn engine(&self, provider: MockProvider) -> Engine {
        Engine::new(
            Arc::new(provider),
            self.executor(),
            self.conversations.clone(),
            EngineConfig::default().with_model("mock-model"),
        )
    }

    pub async fn read(&self, path: &str) -> Option<Value> {
        self.store.read(&ctx(), path).await.unwrap()
    }

    /// Every file under the mirror root with its contents, sorted by path
    pub fn mirror_snapshot(&self) -> Vec<(String, String)> {
        let mut files: Vec<(String, String)> = walkdir::WalkDir::new(self.dir.path())
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                let rel = entry
                    .path()
                    .strip_prefix(self.dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .to_string();
                let body = std::fs::read_to_string(entry.path()).unwrap();
                (rel, body)
            })
            .collect();
        files.sort();
        files
    }

    /// Every document in the database for the test site
    pub fn db_snapshot(&self) -> Vec<(String, Value)> {
        self.store
            .database()
            .unwrap()
            .list(SITE, LOCALE, "")
            .unwrap()
    }
}
