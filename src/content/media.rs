// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Media URL normalization and media library lookup

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::content::store::ContentStore;
use crate::error::Result;
use crate::tools::ToolContext;

/// Rewrite embedded media URLs to site-relative `/media/...` form.
///
/// Absolute URLs under `public_base_url` lose their origin, and bare
/// `media/...` references gain a leading slash. Everything else is untouched.
pub fn normalize_media_urls(doc: &Value, public_base_url: Option<&str>) -> Value {
    match doc {
        Value::String(s) => Value::String(normalize_url(s, public_base_url)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| normalize_media_urls(item, public_base_url))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_media_urls(v, public_base_url)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn normalize_url(s: &str, public_base_url: Option<&str>) -> String {
    if let Some(base) = public_base_url.map(|b| b.trim_end_matches('/')) {
        if !base.is_empty() {
            if let Some(rest) = s.strip_prefix(base) {
                if rest.starts_with("/media/") {
                    return rest.to_string();
                }
            }
        }
    }
    if s.starts_with("media/") && !s.contains(char::is_whitespace) {
        return format!("/{}", s);
    }
    s.to_string()
}

/// One asset in the site's media library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Read access to a site's media assets
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    /// All assets for the context's site and locale
    async fn list(&self, ctx: &ToolContext) -> Result<Vec<MediaAsset>>;
}

/// Media library backed by a JSON document in the content store
pub struct DocumentMediaLibrary {
    store: Arc<dyn ContentStore>,
    path: String,
}

impl DocumentMediaLibrary {
    pub fn new(store: Arc<dyn ContentStore>, path: impl Into<String>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }
}

#[async_trait]
impl MediaLibrary for DocumentMediaLibrary {
    async fn list(&self, ctx: &ToolContext) -> Result<Vec<MediaAsset>> {
        let Some(doc) = self.store.read(ctx, &self.path).await? else {
            return Ok(Vec::new());
        };
        let entries = match doc {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("assets") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };

        let mut assets = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<MediaAsset>(entry) {
                Ok(asset) => assets.push(asset),
                Err(e) => tracing::debug!(
                    target: "sitepilot.content.media",
                    error = %e,
                    "skipping malformed media entry"
                ),
            }
        }
        Ok(assets)
    }
}

/// Fuzzy search over assets; best matches first, zero scores dropped
pub fn search_assets<'a>(assets: &'a [MediaAsset], query: &str, limit: usize) -> Vec<&'a MediaAsset> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return assets.iter().take(limit).collect();
    }
    let query_tokens = tokenize(&query);

    let mut scored: Vec<(u32, &MediaAsset)> = assets
        .iter()
        .map(|asset| (score_asset(asset, &query, &query_tokens), asset))
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));
    scored.into_iter().take(limit).map(|(_, a)| a).collect()
}

fn score_asset(asset: &MediaAsset, query: &str, query_tokens: &[String]) -> u32 {
    let name = asset.name.to_lowercase();
    let alt = asset.alt.as_deref().unwrap_or_default().to_lowercase();
    let tags: Vec<String> = asset.tags.iter().map(|t| t.to_lowercase()).collect();

    let mut score = 0;
    if name == query {
        score += 100;
    } else if name.contains(query) {
        score += 40;
    }
    if alt.contains(query) {
        score += 20;
    }
    if tags.iter().any(|t| t == query) {
        score += 30;
    }

    let mut haystack = tokenize(&name);
    haystack.extend(tokenize(&alt));
    haystack.extend(tags.iter().flat_map(|t| tokenize(t)));
    for token in query_tokens {
        if haystack.iter().any(|h| h == token) {
            score += 10;
        } else if haystack.iter().any(|h| h.starts_with(token.as_str())) {
            score += 4;
        }
    }
    score
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn asset(name: &str, alt: Option<&str>, tags: &[&str]) -> MediaAsset {
        MediaAsset {
            id: name.to_string(),
            name: name.to_string(),
            url: format!("/media/{}", name),
            alt: alt.map(str::to_string),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            kind: Some("image".to_string()),
        }
    }

    #[test]
    fn test_normalize_absolute_urls() {
        let doc = json!({
            "hero": {"image": "https://cdn.example.com/media/hero.jpg"},
            "other": "https://elsewhere.com/media/x.jpg"
        });
        let out = normalize_media_urls(&doc, Some("https://cdn.example.com/"));
        assert_eq!(out["hero"]["image"], "/media/hero.jpg");
        assert_eq!(out["other"], "https://elsewhere.com/media/x.jpg");
    }

    #[test]
    fn test_normalize_bare_paths() {
        let doc = json!({"gallery": ["media/a.png", "media is great", "/media/b.png"]});
        let out = normalize_media_urls(&doc, None);
        assert_eq!(out["gallery"], json!(["/media/a.png", "media is great", "/media/b.png"]));
    }

    #[test]
    fn test_normalize_leaves_input_untouched() {
        let doc = json!({"img": "media/a.png", "n": 3});
        let snapshot = doc.clone();
        let _ = normalize_media_urls(&doc, None);
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn test_search_exact_name_first() {
        let assets = vec![
            asset("beach-house", Some("house by the beach"), &[]),
            asset("house", None, &[]),
            asset("office", None, &["interior"]),
        ];
        let hits = search_assets(&assets, "house", 10);
        assert_eq!(hits[0].name, "house");
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_search_by_tag_and_prefix() {
        let assets = vec![asset("img-001", None, &["kitchen", "interior"])];
        assert_eq!(search_assets(&assets, "kitchen", 10).len(), 1);
        assert_eq!(search_assets(&assets, "kitch", 10).len(), 1);
        assert!(search_assets(&assets, "garden", 10).is_empty());
    }

    #[test]
    fn test_search_empty_query_lists() {
        let assets = vec![asset("a", None, &[]), asset("b", None, &[])];
        assert_eq!(search_assets(&assets, " ", 1).len(), 1);
    }
}
