// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Site-wide settings tools
//!
//! Settings are split across `settings/{site,header,footer,seo,theme}.json`.
//! Business details, opening hours and social links live in the site
//! document; SEO can be set per page or globally.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::{PilotError, Result};
use crate::llm::provider::ToolDefinition;
use crate::tools::{
    FieldChange, SchemaBuilder, Tool, ToolContext, ToolPreview, ToolResult, ToolServices,
};

use super::{
    alias_note, apply_edits, load_document, load_or_empty, opt_str_arg, page_slug_arg,
    refresh_after, str_arg, value_arg, FieldEdit,
};

const SETTINGS_SECTIONS: [&str; 5] = ["site", "header", "footer", "seo", "theme"];

fn settings_path(section: &str) -> String {
    format!("settings/{}.json", section)
}

fn strip_seo(path: &str) -> String {
    path.strip_prefix("seo.").unwrap_or(path).to_string()
}

/// Apply edits to the site document and build the result
async fn edit_site_document(
    tool: &str,
    ctx: &ToolContext,
    services: &ToolServices,
    edits: Vec<FieldEdit>,
    describe: impl FnOnce(&[FieldChange]) -> String,
) -> Result<ToolResult> {
    let path = settings_path("site");
    let doc = load_or_empty(services, ctx, &path).await?;
    let (updated, mut changes) = apply_edits(&services.aliases, &doc, edits)?;
    let stored = services.content.write(ctx, &path, updated).await?;
    refresh_after(&mut changes, &stored);

    let summary = ctx.describe(format!("{}{}", describe(&changes), alias_note(&changes)));
    let fields: Vec<&str> = changes.iter().map(|c| c.resolved.as_str()).collect();
    Ok(ToolResult::success(tool, summary)
        .with_data(json!({ "fields": fields }))
        .with_changed_path(path.clone())
        .with_preview(ToolPreview::from_changes(path, &changes)))
}

/// Tool for reading every settings document at once
pub struct ReadSiteSettingsTool;

#[async_trait]
impl Tool for ReadSiteSettingsTool {
    fn name(&self) -> &str {
        "read_site_settings"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "read_site_settings".to_string(),
            description: "Read the site-wide settings bundle: site (business details, hours, social links), header, footer, seo and theme.".to_string(),
            input_schema: SchemaBuilder::new().build(),
        }
    }

    async fn execute(
        &self,
        _args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let mut bundle = Map::new();
        let mut present = 0;
        for section in SETTINGS_SECTIONS {
            let doc = services.content.read(ctx, &settings_path(section)).await?;
            if doc.is_some() {
                present += 1;
            }
            bundle.insert(section.to_string(), doc.unwrap_or_else(|| json!({})));
        }

        Ok(ToolResult::success(
            "read_site_settings",
            format!("Read site settings ({} of {} documents present)", present, SETTINGS_SECTIONS.len()),
        )
        .with_data(Value::Object(bundle)))
    }
}

/// Tool for updating one business detail
pub struct UpdateBusinessFieldTool;

#[async_trait]
impl Tool for UpdateBusinessFieldTool {
    fn name(&self) -> &str {
        "update_business_field"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "update_business_field".to_string(),
            description: "Update one business detail in the site settings, e.g. name, phone, email or address.street.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("field", "Business field, e.g. 'phone' or 'address.city'", true)
                .any("value", "New value", true)
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
        let field = str_arg(args, "field")?;
        let field = field.strip_prefix("business.").unwrap_or(field);
        let value = value_arg(args, "value")?;

        edit_site_document(
            "update_business_field",
            ctx,
            services,
            vec![FieldEdit::new(format!("business.{}", field), value)],
            |changes| format!("Updated {}", changes[0].resolved),
        )
        .await
    }
}

/// Tool for updating opening hours
pub struct UpdateBusinessHoursTool;

#[async_trait]
impl Tool for UpdateBusinessHoursTool {
    fn name(&self) -> &str {
        "update_business_hours"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "update_business_hours".to_string(),
            description: "Update opening hours. With 'day', sets that day's hours (e.g. '9:00-17:00' or 'closed'); without it, replaces the whole hours object.".to_string(),
            input_schema: SchemaBuilder::new()
                .any("hours", "Hours for the day, or an object of day -> hours", true)
                .string("day", "Optional day of week, e.g. 'monday'", false)
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
        let hours = value_arg(args, "hours")?;
        let (field, label) = match opt_str_arg(args, "day") {
            Some(day) => {
                let day = day.to_lowercase();
                (format!("business.hours.{}", day), format!("hours for {}", day))
            }
            None => {
                if !hours.is_object() {
                    return Err(PilotError::InvalidInput(
                        "hours must be an object of day -> hours when no day is given".to_string(),
                    ));
                }
                ("business.hours".to_string(), "business hours".to_string())
            }
        };

        edit_site_document(
            "update_business_hours",
            ctx,
            services,
            vec![FieldEdit::new(field, hours)],
            |_| format!("Updated {}", label),
        )
        .await
    }
}

/// Tool for updating SEO metadata on a page or site-wide
pub struct UpdateSeoTool;

#[async_trait]
impl Tool for UpdateSeoTool {
    fn name(&self) -> &str {
        "update_seo"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "update_seo".to_string(),
            description: "Update an SEO field (title, description, keywords, og_image). With 'page', edits that page's seo block; without it, edits the site-wide SEO defaults.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("field", "SEO field, e.g. 'title' or 'description'", true)
                .any("value", "New value", true)
                .string("page", "Optional page slug", false)
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
        let field = str_arg(args, "field")?;
        let field = field.strip_prefix("seo.").unwrap_or(field);
        let value = value_arg(args, "value")?;
        let edit = vec![FieldEdit::new(format!("seo.{}", field), value)];

        if opt_str_arg(args, "page").is_some() {
            let slug = page_slug_arg(services, args)?;
            let path = services.catalog.page_path(&slug);
            let doc = load_document(services, ctx, &path, &format!("page '{}'", slug)).await?;
            let (updated, mut changes) = apply_edits(&services.aliases, &doc, edit)?;
            let stored = services.content.write(ctx, &path, updated).await?;
            refresh_after(&mut changes, &stored);

            let summary = ctx.describe(format!(
                "Updated {} on page '{}'{}",
                changes[0].resolved,
                slug,
                alias_note(&changes)
            ));
            return Ok(ToolResult::success("update_seo", summary)
                .with_data(json!({ "page": slug, "field_path": changes[0].resolved }))
                .with_changed_path(path.clone())
                .with_preview(ToolPreview::from_changes(path, &changes)));
        }

        // The global document is the seo node itself; wrap it so the seo
        // alias context applies.
        let path = settings_path("seo");
        let doc = load_or_empty(services, ctx, &path).await?;
        let wrapped = json!({ "seo": doc });
        let (updated, changes) = apply_edits(&services.aliases, &wrapped, edit)?;
        let updated = updated.get("seo").cloned().unwrap_or_else(|| json!({}));
        let stored = services.content.write(ctx, &path, updated).await?;

        let mut changes: Vec<FieldChange> = changes
            .into_iter()
            .map(|c| FieldChange {
                requested: strip_seo(&c.requested),
                resolved: strip_seo(&c.resolved),
                ..c
            })
            .collect();
        refresh_after(&mut changes, &stored);

        let summary = ctx.describe(format!(
            "Updated site-wide SEO {}{}",
            changes[0].resolved,
            alias_note(&changes)
        ));
        Ok(ToolResult::success("update_seo", summary)
            .with_data(json!({ "field_path": changes[0].resolved }))
            .with_changed_path(path.clone())
            .with_preview(ToolPreview::from_changes(path, &changes)))
    }
}

/// Tool for setting one social network link
pub struct UpdateSocialLinkTool;

#[async_trait]
impl Tool for UpdateSocialLinkTool {
    fn name(&self) -> &str {
        "update_social_link"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "update_social_link".to_string(),
            description: "Set the profile URL for one social network (e.g. facebook, instagram, linkedin).".to_string(),
            input_schema: SchemaBuilder::new()
                .string("network", "Social network name", true)
                .string("url", "Profile URL", true)
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
        let network = str_arg(args, "network")?.to_lowercase();
        if network.contains('.') || network.contains('[') {
            return Err(PilotError::InvalidInput(format!(
                "invalid social network name '{}'",
                network
            )));
        }
        let url = str_arg(args, "url")?;

        edit_site_document(
            "update_social_link",
            ctx,
            services,
            vec![FieldEdit::new(format!("social.{}", network), json!(url))],
            |_| format!("Updated {} link", network),
        )
        .await
    }
}
