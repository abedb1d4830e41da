// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool system for sitepilot
//!
//! Provides the named operations the model may call to read and mutate site
//! content: pages, collection entities, site settings, media lookup and
//! preferences. Tools are dispatched by name through [`ToolExecutor`].

pub mod builtin;
pub mod definition;
pub mod executor;
pub mod permission;

pub use definition::*;
pub use executor::*;
pub use permission::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::content::{CatalogConfig, ContentStore, FieldAliases, MediaLibrary};
use crate::conversation::PreferenceStore;
use crate::error::Result;
use crate::llm::provider::ToolDefinition;

/// Request-scoped context threaded through every tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
    /// Tenant site
    pub site_id: String,
    /// Content locale
    pub locale: String,
    /// Actor recorded on writes
    pub actor_email: String,
    /// Compute and preview, never persist
    pub dry_run: bool,
}

impl ToolContext {
    /// Create a new tool context
    pub fn new(
        site_id: impl Into<String>,
        locale: impl Into<String>,
        actor_email: impl Into<String>,
    ) -> Self {
        Self {
            site_id: site_id.into(),
            locale: locale.into(),
            actor_email: actor_email.into(),
            dry_run: false,
        }
    }

    /// Set dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Append a dry-run marker to a summary when applicable
    pub fn describe(&self, summary: impl Into<String>) -> String {
        let summary = summary.into();
        if self.dry_run {
            format!("{} (dry-run, nothing saved)", summary)
        } else {
            summary
        }
    }
}

/// One field edit as applied to a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Path as requested by the caller
    pub requested: String,
    /// Path actually written after alias resolution
    pub resolved: String,
    pub before: Value,
    pub after: Value,
}

/// Enough detail to render a diff without re-reading storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolPreview {
    /// Logical document path
    pub document: String,
    /// Resolved field path for single-field edits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
    /// Requested field path, present only when it differs from `field_path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_path: Option<String>,
    /// Requested -> resolved pairs for multi-field edits that were aliased
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
    pub before: Value,
    pub after: Value,
}

impl ToolPreview {
    /// Whole-document preview (create, remove)
    pub fn document(document: impl Into<String>, before: Value, after: Value) -> Self {
        Self {
            document: document.into(),
            field_path: None,
            requested_path: None,
            aliases: BTreeMap::new(),
            before,
            after,
        }
    }

    /// Preview for one or more field edits on a document
    pub fn from_changes(document: impl Into<String>, changes: &[FieldChange]) -> Self {
        let document = document.into();
        if let [change] = changes {
            return Self {
                document,
                field_path: Some(change.resolved.clone()),
                requested_path: (change.requested != change.resolved)
                    .then(|| change.requested.clone()),
                aliases: BTreeMap::new(),
                before: change.before.clone(),
                after: change.after.clone(),
            };
        }

        let mut before = serde_json::Map::new();
        let mut after = serde_json::Map::new();
        let mut aliases = BTreeMap::new();
        for change in changes {
            before.insert(change.resolved.clone(), change.before.clone());
            after.insert(change.resolved.clone(), change.after.clone());
            if change.requested != change.resolved {
                aliases.insert(change.requested.clone(), change.resolved.clone());
            }
        }
        Self {
            document,
            field_path: None,
            requested_path: None,
            aliases,
            before: Value::Object(before),
            after: Value::Object(after),
        }
    }
}

/// Outcome of one executed tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub ok: bool,
    /// Tool name
    pub tool: String,
    /// Short human-readable description; mentions dry-run when applicable
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Every document address mutated (or, on dry-run, that would be)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changed_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<ToolPreview>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            ok: true,
            tool: tool.into(),
            summary: summary.into(),
            data: None,
            changed_paths: Vec::new(),
            preview: None,
        }
    }

    /// Create a failed result
    pub fn failure(tool: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            ok: false,
            ..Self::success(tool, summary)
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_changed_path(mut self, path: impl Into<String>) -> Self {
        self.changed_paths.push(path.into());
        self
    }

    pub fn with_preview(mut self, preview: ToolPreview) -> Self {
        self.preview = Some(preview);
        self
    }

    /// JSON form fed back to the model
    pub fn to_message_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.summary.clone())
    }
}

/// Collaborators available to every tool
#[derive(Clone)]
pub struct ToolServices {
    pub content: Arc<dyn ContentStore>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub media: Arc<dyn MediaLibrary>,
    pub catalog: CatalogConfig,
    pub aliases: FieldAliases,
}

impl ToolServices {
    /// Bundle services, deriving the alias table from the catalog
    pub fn new(
        content: Arc<dyn ContentStore>,
        preferences: Arc<dyn PreferenceStore>,
        media: Arc<dyn MediaLibrary>,
        catalog: CatalogConfig,
    ) -> Self {
        let aliases = FieldAliases::with_extra(&catalog.field_aliases);
        Self {
            content,
            preferences,
            media,
            catalog,
            aliases,
        }
    }
}

/// Trait for implementing tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool definition for the LLM
    fn definition(&self) -> ToolDefinition;

    /// Whether the tool can change persisted state
    fn is_mutating(&self) -> bool {
        false
    }

    /// Execute the tool with validated arguments
    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult>;
}

/// Registry of available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with all built-in tools
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        // Pages
        registry.register(Arc::new(builtin::ListPagesTool));
        registry.register(Arc::new(builtin::ReadPageTool));
        registry.register(Arc::new(builtin::UpdatePageFieldTool));
        registry.register(Arc::new(builtin::UpdatePageFieldsTool));
        registry.register(Arc::new(builtin::SetSectionVariantTool));

        // Collection entities
        registry.register(Arc::new(builtin::ListEntitiesTool));
        registry.register(Arc::new(builtin::ReadEntityTool));
        registry.register(Arc::new(builtin::UpdateEntityFieldTool));
        registry.register(Arc::new(builtin::CreateEntityTool));
        registry.register(Arc::new(builtin::RemoveEntityTool));

        // Site settings
        registry.register(Arc::new(builtin::ReadSiteSettingsTool));
        registry.register(Arc::new(builtin::UpdateBusinessFieldTool));
        registry.register(Arc::new(builtin::UpdateBusinessHoursTool));
        registry.register(Arc::new(builtin::UpdateSeoTool));
        registry.register(Arc::new(builtin::UpdateSocialLinkTool));

        // Media
        registry.register(Arc::new(builtin::ListMediaTool));
        registry.register(Arc::new(builtin::SearchMediaTool));

        // Preferences
        registry.register(Arc::new(builtin::ListPreferencesTool));
        registry.register(Arc::new(builtin::SetPreferenceTool));

        registry
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// All tool definitions, ordered by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// List all tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
