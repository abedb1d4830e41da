// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Context hints appended to the user message
//!
//! The hint block names the page the instruction most likely targets, that
//! page's key names, and stored preferences. It is advisory only and is
//! never persisted; lookups that fail are logged and skipped.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::tools::{ToolContext, ToolServices};

const HINT_OPEN: &str = "[Context]";
const HINT_CLOSE: &str = "[/Context]";

fn page_phrase_regex() -> &'static Regex {
    static PAGE_PHRASE: OnceLock<Regex> = OnceLock::new();
    PAGE_PHRASE.get_or_init(|| {
        Regex::new(r"(?i)\b([a-z0-9][a-z0-9-]*)\s+page\b|\bpage\s+([a-z0-9][a-z0-9-]*)\b")
            .expect("page phrase regex is valid")
    })
}

/// Best-effort guess of the page slug an instruction is about
pub fn detect_target_page(message: &str, slugs: &[String]) -> Option<String> {
    let lower = message.to_lowercase();
    let known = |candidate: &str| slugs.iter().find(|s| s.as_str() == candidate).cloned();

    if lower.contains("homepage") || lower.contains("home page") || lower.contains("landing page")
    {
        if let Some(home) = known("home") {
            return Some(home);
        }
    }

    // "about page" / "page about"
    for caps in page_phrase_regex().captures_iter(&lower) {
        let word = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
        if let Some(slug) = word.and_then(known) {
            return Some(slug);
        }
    }

    // Explicit mention of a slug, with dashes read as spaces
    slugs
        .iter()
        .filter(|slug| {
            let spoken = slug.replace('-', " ");
            contains_word(&lower, slug) || contains_word(&lower, &spoken)
        })
        .max_by_key(|slug| slug.len())
        .cloned()
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn object_keys(value: Option<&Value>) -> Option<String> {
    let keys: Vec<&str> = value?.as_object()?.keys().map(String::as_str).collect();
    (!keys.is_empty()).then(|| keys.join(", "))
}

/// Build the hint block, or `None` when there is nothing useful to say
pub async fn build_context_hints(
    services: &ToolServices,
    ctx: &ToolContext,
    message: &str,
) -> Option<String> {
    let mut lines = Vec::new();

    match services
        .content
        .list_by_prefix(ctx, &services.catalog.pages_prefix)
        .await
    {
        Ok(pages) => {
            let slugs: Vec<String> = pages
                .iter()
                .filter_map(|doc| services.catalog.page_slug(&doc.path).map(str::to_string))
                .collect();
            if !slugs.is_empty() {
                lines.push(format!("Pages: {}", slugs.join(", ")));
            }
            if let Some(slug) = detect_target_page(message, &slugs) {
                let path = services.catalog.page_path(&slug);
                lines.push(format!("Likely target page: {} ({})", slug, path));
                if let Some(doc) = pages.iter().find(|d| d.path == path).map(|d| &d.content) {
                    if let Some(keys) = object_keys(Some(doc)) {
                        lines.push(format!("Top-level keys: {}", keys));
                    }
                    if let Some(keys) = object_keys(doc.get("hero")) {
                        lines.push(format!("Hero keys: {}", keys));
                    }
                    if let Some(keys) = object_keys(doc.get("seo")) {
                        lines.push(format!("SEO keys: {}", keys));
                    }
                }
            }
        }
        Err(e) => tracing::debug!(
            target: "sitepilot.agent.engine",
            error = %e,
            "page listing for context hints failed"
        ),
    }

    match services.preferences.list(&ctx.site_id, &ctx.locale).await {
        Ok(preferences) if !preferences.is_empty() => {
            lines.push("Preferences:".to_string());
            for p in preferences {
                lines.push(format!("- {}: {}", p.key, p.value));
            }
        }
        Ok(_) => {}
        Err(e) => tracing::debug!(
            target: "sitepilot.agent.engine",
            error = %e,
            "preference lookup for context hints failed"
        ),
    }

    if lines.is_empty() {
        return None;
    }

    lines.push("This context is background only; the user's instructions take precedence.".to_string());
    Some(format!("{}\n{}\n{}", HINT_OPEN, lines.join("\n"), HINT_CLOSE))
}

/// User message as sent to the provider
pub fn with_hints(message: &str, hints: Option<&str>) -> String {
    match hints {
        Some(block) => format!("{}\n\n{}", message, block),
        None => message.to_string(),
    }
}
