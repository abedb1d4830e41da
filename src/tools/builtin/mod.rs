// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Built-in tools for sitepilot

mod entities;
mod media;
mod pages;
mod preferences;
mod site_settings;

pub use entities::{
    CreateEntityTool, ListEntitiesTool, ReadEntityTool, RemoveEntityTool, UpdateEntityFieldTool,
};
pub use media::{ListMediaTool, SearchMediaTool};
pub use pages::{
    ListPagesTool, ReadPageTool, SetSectionVariantTool, UpdatePageFieldTool, UpdatePageFieldsTool,
};
pub use preferences::{ListPreferencesTool, SetPreferenceTool};
pub use site_settings::{
    ReadSiteSettingsTool, UpdateBusinessFieldTool, UpdateBusinessHoursTool, UpdateSeoTool,
    UpdateSocialLinkTool,
};

use serde_json::Value;

use crate::content::{get_value, set_value, FieldAliases};
use crate::error::{PilotError, Result};
use crate::tools::{FieldChange, ToolContext, ToolServices};

/// Required, non-blank string argument
pub(crate) fn str_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str> {
    match args.get(name).and_then(Value::as_str).map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(PilotError::InvalidInput(format!("{} is required", name))),
    }
}

/// Optional string argument; blank counts as absent
pub(crate) fn opt_str_arg<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Optional non-negative integer argument
pub(crate) fn opt_usize_arg(args: &Value, name: &str) -> Option<usize> {
    args.get(name).and_then(Value::as_u64).map(|n| n as usize)
}

/// Required argument of any JSON type
pub(crate) fn value_arg(args: &Value, name: &str) -> Result<Value> {
    match args.get(name) {
        Some(value) if !value.is_null() => Ok(value.clone()),
        _ => Err(PilotError::InvalidInput(format!("{} is required", name))),
    }
}

/// Page slug from "home", "/about/", "pages/about.json" and similar
pub(crate) fn page_slug_arg(services: &ToolServices, args: &Value) -> Result<String> {
    let raw = str_arg(args, "page")?;
    let mut slug = raw.trim_matches('/');
    slug = slug
        .strip_prefix(services.catalog.pages_prefix.as_str())
        .unwrap_or(slug);
    slug = slug.strip_suffix(".json").unwrap_or(slug);
    let slug = slug.trim_matches('/');
    if slug.is_empty() {
        Ok("home".to_string())
    } else {
        Ok(slug.to_lowercase())
    }
}

/// Read a document that must exist
pub(crate) async fn load_document(
    services: &ToolServices,
    ctx: &ToolContext,
    path: &str,
    what: &str,
) -> Result<Value> {
    services
        .content
        .read(ctx, path)
        .await?
        .ok_or_else(|| PilotError::NotFound(format!("{} not found ({})", what, path)))
}

/// Read a document, starting from an empty object when it does not exist
pub(crate) async fn load_or_empty(
    services: &ToolServices,
    ctx: &ToolContext,
    path: &str,
) -> Result<Value> {
    Ok(services
        .content
        .read(ctx, path)
        .await?
        .unwrap_or_else(|| Value::Object(serde_json::Map::new())))
}

/// One requested field assignment
pub(crate) struct FieldEdit {
    pub requested: String,
    pub value: Value,
}

impl FieldEdit {
    pub fn new(requested: impl Into<String>, value: Value) -> Self {
        Self {
            requested: requested.into(),
            value,
        }
    }
}

/// Apply edits in order, resolving each friendly path against the document
/// as updated by the edits before it
pub(crate) fn apply_edits(
    aliases: &FieldAliases,
    doc: &Value,
    edits: Vec<FieldEdit>,
) -> Result<(Value, Vec<FieldChange>)> {
    let mut current = doc.clone();
    let mut changes = Vec::with_capacity(edits.len());
    for edit in edits {
        let resolved = aliases.resolve(&current, &edit.requested);
        let before = get_value(&current, &resolved.resolved)
            .cloned()
            .unwrap_or(Value::Null);
        current = set_value(&current, &resolved.resolved, edit.value.clone())
            .map_err(|e| PilotError::InvalidInput(format!("field path error: {}", e)))?;
        changes.push(FieldChange {
            requested: resolved.requested,
            resolved: resolved.resolved,
            before,
            after: edit.value,
        });
    }
    Ok((current, changes))
}

/// Replace each change's `after` with the value found in the stored document
pub(crate) fn refresh_after(changes: &mut [FieldChange], stored: &Value) {
    for change in changes {
        if let Some(value) = get_value(stored, &change.resolved) {
            change.after = value.clone();
        }
    }
}

/// Summary suffix recording an aliased path
pub(crate) fn alias_note(changes: &[FieldChange]) -> String {
    let aliased: Vec<String> = changes
        .iter()
        .filter(|c| c.requested != c.resolved)
        .map(|c| format!("'{}' -> '{}'", c.requested, c.resolved))
        .collect();
    if aliased.is_empty() {
        String::new()
    } else {
        format!(" (resolved {})", aliased.join(", "))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use serde_json::Value;
    use tempfile::TempDir;

    use crate::content::{
        CatalogConfig, ContentStore, DocumentMediaLibrary, DualContentStore, FileMirror,
        SqliteDocuments,
    };
    use crate::conversation::SqlitePreferenceStore;
    use crate::tools::{ToolContext, ToolServices};

    pub fn ctx() -> ToolContext {
        ToolContext::new("s1", "en", "editor@example.com")
    }

    /// Services over an in-memory database and a temporary mirror, seeded
    /// with the given documents for site "s1", locale "en"
    pub async fn services_with_docs(docs: &[(&str, Value)]) -> (ToolServices, TempDir) {
        let dir = TempDir::new().unwrap();
        let catalog = CatalogConfig::default();
        let db = SqliteDocuments::in_memory(&catalog.dedicated_tables()).unwrap();
        let store: Arc<dyn ContentStore> = Arc::new(DualContentStore::new(
            Some(db),
            FileMirror::new(dir.path()),
            catalog.clone(),
        ));
        for (path, doc) in docs {
            store.write(&ctx(), path, doc.clone()).await.unwrap();
        }
        let services = ToolServices::new(
            store.clone(),
            Arc::new(SqlitePreferenceStore::in_memory().unwrap()),
            Arc::new(DocumentMediaLibrary::new(store, "media/library.json")),
            catalog,
        );
        (services, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::services_with_docs;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_page_slug_arg_forms() {
        let (services, _dir) = services_with_docs(&[]).await;
        for (raw, expected) in [
            ("home", "home"),
            ("/about/", "about"),
            ("pages/contact.json", "contact"),
            ("/", "home"),
            ("About", "about"),
        ] {
            assert_eq!(page_slug_arg(&services, &json!({ "page": raw })).unwrap(), expected);
        }
        assert!(page_slug_arg(&services, &json!({})).is_err());
    }

    #[test]
    fn test_apply_edits_resolves_against_progressive_doc() {
        let aliases = FieldAliases::default();
        let doc = json!({"headline": "Old", "subline": "Sub"});
        let edits = vec![
            FieldEdit::new("title", json!("New")),
            FieldEdit::new("subtitle", json!("Sub 2")),
            FieldEdit::new("cta.label", json!("Go")),
        ];
        let (updated, changes) = apply_edits(&aliases, &doc, edits).unwrap();
        assert_eq!(updated["headline"], "New");
        assert_eq!(updated["subline"], "Sub 2");
        assert_eq!(updated["cta"]["label"], "Go");
        assert_eq!(changes[0].resolved, "headline");
        assert_eq!(changes[0].before, json!("Old"));
        assert_eq!(changes[2].before, Value::Null);
        assert_eq!(doc["headline"], "Old");
        assert!(alias_note(&changes).contains("'title' -> 'headline'"));
    }

    #[test]
    fn test_apply_edits_bad_path() {
        let aliases = FieldAliases::default();
        let err = apply_edits(&aliases, &json!({}), vec![FieldEdit::new("a..b", json!(1))])
            .unwrap_err();
        assert!(err.to_string().contains("path"));
    }

    #[test]
    fn test_str_arg() {
        let args = json!({"a": "  x ", "b": "  ", "c": 3});
        assert_eq!(str_arg(&args, "a").unwrap(), "x");
        assert!(str_arg(&args, "b").is_err());
        assert!(str_arg(&args, "c").is_err());
        assert_eq!(opt_str_arg(&args, "b"), None);
    }
}
