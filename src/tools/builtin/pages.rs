// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Page document tools
//!
//! Pages live at `<pages_prefix><slug>.json`. Edits accept friendly field
//! names; the resolved path is reported whenever it differs from the one
//! requested.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::content::get_value;
use crate::error::{PilotError, Result};
use crate::llm::provider::ToolDefinition;
use crate::tools::{SchemaBuilder, Tool, ToolContext, ToolPreview, ToolResult, ToolServices};

use super::{
    alias_note, apply_edits, load_document, page_slug_arg, refresh_after, str_arg, value_arg,
    FieldEdit,
};

/// Best display title for a page document
fn page_title(doc: &Value) -> Option<&str> {
    ["title", "headline", "seo.title", "hero.headline", "hero.title"]
        .iter()
        .find_map(|path| get_value(doc, path).and_then(Value::as_str))
}

/// Tool for listing pages
pub struct ListPagesTool;

#[async_trait]
impl Tool for ListPagesTool {
    fn name(&self) -> &str {
        "list_pages"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_pages".to_string(),
            description: "List the site's pages with their slug and title.".to_string(),
            input_schema: SchemaBuilder::new().build(),
        }
    }

    async fn execute(
        &self,
        _args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let docs = services
            .content
            .list_by_prefix(ctx, &services.catalog.pages_prefix)
            .await?;

        let pages: Vec<Value> = docs
            .iter()
            .filter_map(|doc| {
                let slug = services.catalog.page_slug(&doc.path)?;
                Some(json!({
                    "slug": slug,
                    "path": doc.path,
                    "title": page_title(&doc.content),
                }))
            })
            .collect();

        Ok(ToolResult::success("list_pages", format!("Found {} pages", pages.len()))
            .with_data(json!({ "pages": pages })))
    }
}

/// Tool for reading a page or one of its fields
pub struct ReadPageTool;

#[async_trait]
impl Tool for ReadPageTool {
    fn name(&self) -> &str {
        "read_page"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "read_page".to_string(),
            description: "Read a page document, or a single field of it when field_path is given (e.g. 'hero.headline' or 'sections[0].title').".to_string(),
            input_schema: SchemaBuilder::new()
                .string("page", "Page slug, e.g. 'home' or 'about'", true)
                .string("field_path", "Optional dotted field path to read", false)
                .build(),
        }
    }

    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let slug = page_slug_arg(services, args)?;
        let path = services.catalog.page_path(&slug);
        let doc = load_document(services, ctx, &path, &format!("page '{}'", slug)).await?;

        let Some(raw) = super::opt_str_arg(args, "field_path") else {
            return Ok(ToolResult::success("read_page", format!("Read page '{}'", slug))
                .with_data(json!({ "page": slug, "path": path, "content": doc })));
        };

        let resolved = services.aliases.resolve(&doc, raw);
        let value = get_value(&doc, &resolved.resolved).cloned().ok_or_else(|| {
            PilotError::NotFound(format!(
                "field path '{}' not found on page '{}'",
                resolved.resolved, slug
            ))
        })?;

        let mut data = json!({
            "page": slug,
            "path": path,
            "field_path": resolved.resolved,
            "value": value,
        });
        if resolved.changed() {
            data["requested_path"] = json!(resolved.requested);
        }

        Ok(ToolResult::success(
            "read_page",
            format!("Read {} on page '{}'", resolved.resolved, slug),
        )
        .with_data(data))
    }
}

/// Tool for updating one page field
pub struct UpdatePageFieldTool;

#[async_trait]
impl Tool for UpdatePageFieldTool {
    fn name(&self) -> &str {
        "update_page_field"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "update_page_field".to_string(),
            description: "Set one field on a page. Friendly names such as 'title' or 'subtitle' are matched to the page's actual keys.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("page", "Page slug, e.g. 'home'", true)
                .string("field_path", "Dotted field path, e.g. 'hero.headline'", true)
                .any("new_value", "New value (string, number, object or array)", true)
                .build(),
        }
    }

    fn is_mutating(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let slug = page_slug_arg(services, args)?;
        let field_path = str_arg(args, "field_path")?;
        let new_value = value_arg(args, "new_value")?;

        let path = services.catalog.page_path(&slug);
        let doc = load_document(services, ctx, &path, &format!("page '{}'", slug)).await?;

        let (updated, mut changes) =
            apply_edits(&services.aliases, &doc, vec![FieldEdit::new(field_path, new_value)])?;
        let stored = services.content.write(ctx, &path, updated).await?;
        refresh_after(&mut changes, &stored);

        let summary = ctx.describe(format!(
            "Updated {} on page '{}'{}",
            changes[0].resolved,
            slug,
            alias_note(&changes)
        ));
        let mut data = json!({ "page": slug, "field_path": changes[0].resolved });
        if changes[0].requested != changes[0].resolved {
            data["requested_path"] = json!(changes[0].requested);
        }

        Ok(ToolResult::success("update_page_field", summary)
            .with_data(data)
            .with_changed_path(path.clone())
            .with_preview(ToolPreview::from_changes(path, &changes)))
    }
}

/// Tool for updating several page fields at once
pub struct UpdatePageFieldsTool;

#[async_trait]
impl Tool for UpdatePageFieldsTool {
    fn name(&self) -> &str {
        "update_page_fields"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "update_page_fields".to_string(),
            description: "Set several fields on one page in a single write. 'updates' maps field paths to new values.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("page", "Page slug, e.g. 'home'", true)
                .object("updates", "Object of field_path -> new value", true)
                .build(),
        }
    }

    fn is_mutating(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let slug = page_slug_arg(services, args)?;
        let updates = args
            .get("updates")
            .and_then(Value::as_object)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                PilotError::InvalidInput("updates must be a non-empty object".to_string())
            })?;

        let path = services.catalog.page_path(&slug);
        let doc = load_document(services, ctx, &path, &format!("page '{}'", slug)).await?;

        let edits = updates
            .iter()
            .map(|(field, value)| FieldEdit::new(field.clone(), value.clone()))
            .collect();
        let (updated, mut changes) = apply_edits(&services.aliases, &doc, edits)?;
        let stored = services.content.write(ctx, &path, updated).await?;
        refresh_after(&mut changes, &stored);

        let fields: Vec<&str> = changes.iter().map(|c| c.resolved.as_str()).collect();
        let summary = ctx.describe(format!(
            "Updated {} fields on page '{}': {}{}",
            changes.len(),
            slug,
            fields.join(", "),
            alias_note(&changes)
        ));

        Ok(ToolResult::success("update_page_fields", summary)
            .with_data(json!({ "page": slug, "fields": fields }))
            .with_changed_path(path.clone())
            .with_preview(ToolPreview::from_changes(path, &changes)))
    }
}

/// Where a section lives inside a page document
struct SectionLocation {
    /// Path of the section node
    path: String,
    /// Section type used for variant validation
    section_type: String,
}

fn locate_section(doc: &Value, section: &Value) -> Option<SectionLocation> {
    let wanted = match section {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    if let Some(items) = doc.get("sections").and_then(Value::as_array) {
        let by_index = wanted.parse::<usize>().ok().filter(|i| *i < items.len());
        let index = by_index.or_else(|| {
            items.iter().position(|item| {
                ["id", "type", "key"].iter().any(|field| {
                    item.get(*field)
                        .and_then(Value::as_str)
                        .is_some_and(|v| v.eq_ignore_ascii_case(&wanted))
                })
            })
        });
        if let Some(index) = index {
            let section_type = items[index]
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or(&wanted)
                .to_string();
            return Some(SectionLocation {
                path: format!("sections[{}]", index),
                section_type,
            });
        }
    }

    match doc.get(&wanted) {
        Some(Value::Object(node)) => Some(SectionLocation {
            path: wanted.clone(),
            section_type: node
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or(&wanted)
                .to_string(),
        }),
        _ => None,
    }
}

/// Tool for switching a section's layout variant
pub struct SetSectionVariantTool;

#[async_trait]
impl Tool for SetSectionVariantTool {
    fn name(&self) -> &str {
        "set_section_variant"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "set_section_variant".to_string(),
            description: "Change the layout variant of a page section. 'section' is the section index, type or id (e.g. 'hero').".to_string(),
            input_schema: SchemaBuilder::new()
                .string("page", "Page slug, e.g. 'home'", true)
                .any("section", "Section index, type or id", true)
                .string("variant", "Variant name, e.g. 'split' or 'centered'", true)
                .build(),
        }
    }

    fn is_mutating(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let slug = page_slug_arg(services, args)?;
        let section = value_arg(args, "section")?;
        let variant = str_arg(args, "variant")
            .map_err(|_| PilotError::InvalidInput("variant must not be empty".to_string()))?
            .to_lowercase();

        let path = services.catalog.page_path(&slug);
        let doc = load_document(services, ctx, &path, &format!("page '{}'", slug)).await?;

        let location = locate_section(&doc, &section).ok_or_else(|| {
            PilotError::NotFound(format!("section {} not found on page '{}'", section, slug))
        })?;

        if let Some(allowed) = services.catalog.allowed_variants(&location.section_type) {
            if !allowed.iter().any(|v| *v == variant) {
                return Err(PilotError::InvalidInput(format!(
                    "Invalid variant '{}' for {} section. Allowed variants: {}",
                    variant,
                    location.section_type,
                    allowed.join(", ")
                )));
            }
        }

        let field = format!("{}.variant", location.path);
        let (updated, mut changes) =
            apply_edits(&services.aliases, &doc, vec![FieldEdit::new(field, json!(variant))])?;
        let stored = services.content.write(ctx, &path, updated).await?;
        refresh_after(&mut changes, &stored);

        let summary = ctx.describe(format!(
            "Set {} section on page '{}' to variant '{}'",
            location.section_type, slug, variant
        ));

        Ok(ToolResult::success("set_section_variant", summary)
            .with_data(json!({
                "page": slug,
                "section": location.path,
                "section_type": location.section_type,
                "variant": variant,
            }))
            .with_changed_path(path.clone())
            .with_preview(ToolPreview::from_changes(path, &changes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::test_support::{ctx, services_with_docs};

    fn home() -> Value {
        json!({
            "headline": "Hello",
            "subline": "Sub",
            "seo": {"title": "Home | Acme"},
            "sections": [
                {"id": "s-hero", "type": "hero", "variant": "centered"},
                {"id": "s-feat", "type": "features", "variant": "grid"}
            ]
        })
    }

    #[tokio::test]
    async fn test_list_pages() {
        let (services, _dir) = services_with_docs(&[
            ("pages/home.json", home()),
            ("pages/about.json", json!({"title": "About us"})),
            ("agents/jane.json", json!({"name": "Jane"})),
        ])
        .await;
        let result = ListPagesTool.execute(&json!({}), &ctx(), &services).await.unwrap();
        let pages = result.data.unwrap()["pages"].as_array().unwrap().clone();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0]["slug"], "about");
        assert_eq!(pages[0]["title"], "About us");
        assert_eq!(pages[1]["title"], "Hello");
    }

    #[tokio::test]
    async fn test_read_page_field_with_alias() {
        let (services, _dir) = services_with_docs(&[("pages/home.json", home())]).await;
        let result = ReadPageTool
            .execute(&json!({"page": "home", "field_path": "title"}), &ctx(), &services)
            .await
            .unwrap();
        let data = result.data.unwrap();
        assert_eq!(data["value"], "Hello");
        assert_eq!(data["field_path"], "headline");
        assert_eq!(data["requested_path"], "title");
    }

    #[tokio::test]
    async fn test_read_missing_page() {
        let (services, _dir) = services_with_docs(&[]).await;
        let err = ReadPageTool
            .execute(&json!({"page": "nope"}), &ctx(), &services)
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_page_field_resolves_alias() {
        let (services, _dir) = services_with_docs(&[("pages/home.json", home())]).await;
        let result = UpdatePageFieldTool
            .execute(
                &json!({"page": "home", "field_path": "title", "new_value": "Welcome"}),
                &ctx(),
                &services,
            )
            .await
            .unwrap();
        assert!(result.ok);
        assert_eq!(result.changed_paths, vec!["pages/home.json"]);
        let preview = result.preview.unwrap();
        assert_eq!(preview.field_path.as_deref(), Some("headline"));
        assert_eq!(preview.requested_path.as_deref(), Some("title"));
        assert_eq!(preview.before, json!("Hello"));

        let stored = services.content.read(&ctx(), "pages/home.json").await.unwrap().unwrap();
        assert_eq!(stored["headline"], "Welcome");
        assert!(stored.get("title").is_none());
    }

    #[tokio::test]
    async fn test_update_seo_title_keeps_title() {
        let (services, _dir) = services_with_docs(&[("pages/home.json", home())]).await;
        UpdatePageFieldTool
            .execute(
                &json!({"page": "home", "field_path": "seo.title", "new_value": "New"}),
                &ctx(),
                &services,
            )
            .await
            .unwrap();
        let stored = services.content.read(&ctx(), "pages/home.json").await.unwrap().unwrap();
        assert_eq!(stored["seo"]["title"], "New");
    }

    #[tokio::test]
    async fn test_update_page_fields_dry_run() {
        let (services, _dir) = services_with_docs(&[("pages/home.json", home())]).await;
        let dry = ctx().with_dry_run(true);
        let result = UpdatePageFieldsTool
            .execute(
                &json!({"page": "home", "updates": {"title": "A", "subtitle": "B"}}),
                &dry,
                &services,
            )
            .await
            .unwrap();
        assert!(result.summary.contains("dry-run"));
        let preview = result.preview.unwrap();
        assert_eq!(preview.after, json!({"headline": "A", "subline": "B"}));
        assert_eq!(preview.aliases.len(), 2);

        let stored = services.content.read(&ctx(), "pages/home.json").await.unwrap().unwrap();
        assert_eq!(stored, home());
    }

    #[tokio::test]
    async fn test_update_page_fields_requires_updates() {
        let (services, _dir) = services_with_docs(&[("pages/home.json", home())]).await;
        let err = UpdatePageFieldsTool
            .execute(&json!({"page": "home", "updates": {}}), &ctx(), &services)
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_set_section_variant() {
        let (services, _dir) = services_with_docs(&[("pages/home.json", home())]).await;
        let result = SetSectionVariantTool
            .execute(
                &json!({"page": "home", "section": "hero", "variant": "split"}),
                &ctx(),
                &services,
            )
            .await
            .unwrap();
        let preview = result.preview.unwrap();
        assert_eq!(preview.field_path.as_deref(), Some("sections[0].variant"));
        assert_eq!(preview.before, json!("centered"));

        let stored = services.content.read(&ctx(), "pages/home.json").await.unwrap().unwrap();
        assert_eq!(stored["sections"][0]["variant"], "split");
    }

    #[tokio::test]
    async fn test_set_section_variant_by_index() {
        let (services, _dir) = services_with_docs(&[("pages/home.json", home())]).await;
        SetSectionVariantTool
            .execute(
                &json!({"page": "home", "section": 1, "variant": "list"}),
                &ctx(),
                &services,
            )
            .await
            .unwrap();
        let stored = services.content.read(&ctx(), "pages/home.json").await.unwrap().unwrap();
        assert_eq!(stored["sections"][1]["variant"], "list");
    }

    #[tokio::test]
    async fn test_invalid_variant_mentions_variant() {
        let (services, _dir) = services_with_docs(&[("pages/home.json", home())]).await;
        let err = SetSectionVariantTool
            .execute(
                &json!({"page": "home", "section": "hero", "variant": "sparkly"}),
                &ctx(),
                &services,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("variant"));
        assert!(err.to_string().contains("centered"));
    }
}
