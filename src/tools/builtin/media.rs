// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Media lookup tools

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::content::media::search_assets;
use crate::error::Result;
use crate::llm::provider::ToolDefinition;
use crate::tools::{SchemaBuilder, Tool, ToolContext, ToolResult, ToolServices};

use super::{opt_str_arg, opt_usize_arg, str_arg};

const DEFAULT_LIST_LIMIT: usize = 50;
const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Tool for listing media assets
pub struct ListMediaTool;

#[async_trait]
impl Tool for ListMediaTool {
    fn name(&self) -> &str {
        "list_media"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_media".to_string(),
            description: "List assets in the site's media library. Use the returned url when setting image fields.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("kind", "Optional asset kind filter, e.g. 'image' or 'video'", false)
                .integer("limit", "Maximum number of assets (default: 50)", false)
                .build(),
        }
    }

    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let kind = opt_str_arg(args, "kind").map(str::to_lowercase);
        let limit = opt_usize_arg(args, "limit").unwrap_or(DEFAULT_LIST_LIMIT);

        let assets = services.media.list(ctx).await?;
        let total = assets.len();
        let matching: Vec<_> = assets
            .into_iter()
            .filter(|asset| match &kind {
                Some(kind) => asset
                    .kind
                    .as_deref()
                    .is_some_and(|k| k.eq_ignore_ascii_case(kind)),
                None => true,
            })
            .take(limit)
            .collect();

        Ok(ToolResult::success(
            "list_media",
            format!("Listed {} of {} media assets", matching.len(), total),
        )
        .with_data(json!({ "assets": matching })))
    }
}

/// Tool for fuzzy media search
pub struct SearchMediaTool;

#[async_trait]
impl Tool for SearchMediaTool {
    fn name(&self) -> &str {
        "search_media"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_media".to_string(),
            description: "Search the media library by name, alt text or tag. Results are ordered by relevance.".to_string(),
            input_schema: SchemaBuilder::new()
                .string("query", "Search words, e.g. 'office front door'", true)
                .integer("limit", "Maximum number of results (default: 10)", false)
                .build(),
        }
    }

    async fn execute(
        &self,
        args: &Value,
        ctx: &ToolContext,
        services: &ToolServices,
    ) -> Result<ToolResult> {
        let query = str_arg(args, "query")?;
        let limit = opt_usize_arg(args, "limit").unwrap_or(DEFAULT_SEARCH_LIMIT);

        let assets = services.media.list(ctx).await?;
        let hits = search_assets(&assets, query, limit);

        Ok(ToolResult::success(
            "search_media",
            format!("Found {} media assets matching '{}'", hits.len(), query),
        )
        .with_data(json!({ "query": query, "assets": hits })))
    }
}
