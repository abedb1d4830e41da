// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Preference tools
//!
//! Preferences are free-form key/value notes per site and locale (tone of
//! voice, preferred phrasing) that the engine feeds back as context.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::llm::provider::ToolDefinition;
use crate::tools::{SchemaBuilder, Tool, ToolContext, ToolPreview, ToolResult, ToolServices};

use super::str_arg;

/// Tool for listing stored preferences
pub struct ListPreferencesTool;

#[async_trait]
impl Tool for ListPreferencesTool {
    fn name(&self) -> &str {
        "list_preferences"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_preferences".to_string(),
            description: "List the stored editorial preferences for this site.".to_string(),
            input_schema: SchemaBuilder::new().build(),
        }
    }

    async fn execute(
        &self,
        _args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let preferences = services.preferences.list(&ctx.site_id, &ctx.locale).await?;
        let map: Map<String, Value> = preferences
            .iter()
            .map(|p| (p.key.clone(), json!(p.value)))
            .collect();

        Ok(ToolResult::success(
            "list_preferences",
            format!("{} stored preferences", map.len()),
        )
        .with_data(json!({ "preferences": map })))
    }
}

/// Tool for storing one preference
pub struct SetPreferenceTool;

#[async_trait]
impl Tool for SetPreferenceTool {
    fn name(&self) -> &str {
        "set_preference"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "set_preference".to_string(),
            description: "Remember an editorial preference for this site, e.g. key 'tone' with value 'friendly, no exclamation marks'.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("key", "Preference name", true)
                .string("value", "Preference value", true)
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
        let key = str_arg(args, "key")?;
        let value = args.get("value").and_then(Value::as_str).unwrap_or("").trim();

        let before = services
            .preferences
            .list(&ctx.site_id, &ctx.locale)
            .await?
            .into_iter()
            .find(|p| p.key == key)
            .map(|p| json!(p.value))
            .unwrap_or(Value::Null);

        if !ctx.dry_run {
            services
                .preferences
                .set(&ctx.site_id, &ctx.locale, key, value)
                .await?;
        }

        let document = format!("preferences/{}", key);
        Ok(ToolResult::success(
            "set_preference",
            ctx.describe(format!("Saved preference '{}'", key)),
        )
        .with_data(json!({ "key": key, "value": value }))
        .with_preview(ToolPreview::document(&document, before, json!(value)))
        .with_changed_path(document))
    }
}
