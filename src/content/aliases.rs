// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Friendly field-path resolution
//!
//! Maps user or model supplied field names onto the keys a document actually
//! uses. Precedence per segment: exact key, then known synonym present in the
//! document, then the segment unchanged.

use serde_json::Value;
use std::collections::BTreeMap;

use super::path::{format_path, parse_path, PathSegment};

/// A canonical key and the synonyms that may stand in for it
#[derive(Debug, Clone)]
struct AliasGroup {
    canonical: String,
    synonyms: Vec<String>,
}

/// Synonym table used by [`FieldAliases::resolve`]
#[derive(Debug, Clone)]
pub struct FieldAliases {
    general: Vec<AliasGroup>,
    seo: Vec<AliasGroup>,
}

/// Outcome of resolving a friendly path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Path as supplied
    pub requested: String,
    /// Path after alias substitution
    pub resolved: String,
}

impl ResolvedPath {
    /// Whether any segment was substituted
    pub fn changed(&self) -> bool {
        self.requested != self.resolved
    }
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            general: vec![
                group("headline", &["title", "heading", "header"]),
                group("subline", &["subtitle", "subheadline", "subheading"]),
            ],
            seo: vec![group("title", &["headline", "heading", "header"])],
        }
    }
}

fn group(canonical: &str, synonyms: &[&str]) -> AliasGroup {
    AliasGroup {
        canonical: canonical.to_string(),
        synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
    }
}

impl FieldAliases {
    /// Default table extended with configured synonyms (canonical -> synonyms).
    /// Extensions are consulted after the defaults.
    pub fn with_extra(extra: &BTreeMap<String, Vec<String>>) -> Self {
        let mut aliases = Self::default();
        for (canonical, synonyms) in extra {
            aliases.general.push(AliasGroup {
                canonical: canonical.clone(),
                synonyms: synonyms.iter().map(|s| s.to_lowercase()).collect(),
            });
        }
        aliases
    }

    /// Canonical candidates for a key, in precedence order
    fn candidates(&self, key: &str, under_seo: bool) -> Vec<&str> {
        let lowered = key.to_lowercase();
        let table = if under_seo { &self.seo } else { &self.general };
        table
            .iter()
            .filter(|g| g.synonyms.iter().any(|s| *s == lowered))
            .map(|g| g.canonical.as_str())
            .collect()
    }

    /// Resolve `raw` against the keys present in `doc`.
    ///
    /// Malformed paths are returned unchanged; resolution never fails.
    pub fn resolve(&self, doc: &Value, raw: &str) -> ResolvedPath {
        let requested = raw.to_string();
        let Ok(segments) = parse_path(raw) else {
            return ResolvedPath {
                resolved: requested.clone(),
                requested,
            };
        };

        let mut resolved = Vec::with_capacity(segments.len());
        let mut node = Some(doc);
        let mut under_seo = false;

        for segment in segments {
            match segment {
                PathSegment::Key(key) => {
                    let actual = match node {
                        Some(Value::Object(map)) if !map.contains_key(&key) => self
                            .candidates(&key, under_seo)
                            .into_iter()
                            .find(|candidate| map.contains_key(*candidate))
                            .map(str::to_string)
                            .unwrap_or(key),
                        _ => key,
                    };
                    node = match node {
                        Some(Value::Object(map)) => map.get(&actual),
                        Some(Value::Array(items)) => actual
                            .parse::<usize>()
                            .ok()
                            .and_then(|index| items.get(index)),
                        _ => None,
                    };
                    under_seo = actual.eq_ignore_ascii_case("seo");
                    resolved.push(PathSegment::Key(actual));
                }
                PathSegment::Index(index) => {
                    node = match node {
                        Some(Value::Array(items)) => items.get(index),
                        _ => None,
                    };
                    under_seo = false;
                    resolved.push(PathSegment::Index(index));
                }
            }
        }

        ResolvedPath {
            requested,
            resolved: format_path(&resolved),
        }
    }
}

/// Resolve a friendly path using the default synonym table
pub fn resolve_friendly_field_path(doc: &Value, raw: &str) -> String {
    FieldAliases::default().resolve(doc, raw).resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_match_wins() {
        let doc = json!({"title": "A", "headline": "B"});
        assert_eq!(resolve_friendly_field_path(&doc, "title"), "title");
    }

    #[test]
    fn test_title_resolves_to_headline() {
        let doc = json!({"headline": "Hello"});
        assert_eq!(resolve_friendly_field_path(&doc, "title"), "headline");
        assert_eq!(resolve_friendly_field_path(&doc, "heading"), "headline");
        assert_eq!(resolve_friendly_field_path(&doc, "Header"), "headline");
    }

    #[test]
    fn test_subtitle_resolves_to_subline() {
        let doc = json!({"hero": {"subline": "x"}});
        assert_eq!(resolve_friendly_field_path(&doc, "hero.subtitle"), "hero.subline");
        assert_eq!(
            resolve_friendly_field_path(&doc, "hero.subheading"),
            "hero.subline"
        );
    }

    #[test]
    fn test_seo_keeps_title() {
        let doc = json!({"headline": "Page", "seo": {"title": "SEO", "headline": "odd"}});
        assert_eq!(resolve_friendly_field_path(&doc, "seo.title"), "seo.title");

        let doc = json!({"seo": {"title": "SEO"}});
        assert_eq!(resolve_friendly_field_path(&doc, "seo.heading"), "seo.title");
    }

    #[test]
    fn test_seo_title_missing_is_not_rewritten_to_headline() {
        let doc = json!({"seo": {"headline": "x"}});
        assert_eq!(resolve_friendly_field_path(&doc, "seo.title"), "seo.title");
    }

    #[test]
    fn test_unresolved_passes_through() {
        let doc = json!({"hero": {"headline": "x"}});
        assert_eq!(
            resolve_friendly_field_path(&doc, "hero.cta.label"),
            "hero.cta.label"
        );
        assert_eq!(resolve_friendly_field_path(&doc, "footer.title"), "footer.title");
    }

    #[test]
    fn test_synonym_absent_from_document_passes_through() {
        let doc = json!({"name": "x"});
        assert_eq!(resolve_friendly_field_path(&doc, "title"), "title");
    }

    #[test]
    fn test_resolves_inside_arrays() {
        let doc = json!({"sections": [{"type": "hero", "headline": "x"}]});
        assert_eq!(
            resolve_friendly_field_path(&doc, "sections[0].title"),
            "sections[0].headline"
        );
        assert_eq!(
            resolve_friendly_field_path(&doc, "sections.0.title"),
            "sections.0.headline"
        );
    }

    #[test]
    fn test_malformed_path_unchanged() {
        let doc = json!({"headline": "x"});
        assert_eq!(resolve_friendly_field_path(&doc, "title["), "title[");
    }

    #[test]
    fn test_resolved_path_changed_flag() {
        let doc = json!({"headline": "x"});
        let aliases = FieldAliases::default();
        assert!(aliases.resolve(&doc, "title").changed());
        assert!(!aliases.resolve(&doc, "headline").changed());
    }

    #[test]
    fn test_extra_aliases_after_defaults() {
        let mut extra = BTreeMap::new();
        extra.insert("tagline".to_string(), vec!["Slogan".to_string()]);
        extra.insert("blurb".to_string(), vec!["title".to_string()]);
        let aliases = FieldAliases::with_extra(&extra);

        let doc = json!({"tagline": "x", "headline": "y", "blurb": "z"});
        assert_eq!(aliases.resolve(&doc, "slogan").resolved, "tagline");
        // Default synonym still wins over the configured one.
        assert_eq!(aliases.resolve(&doc, "title").resolved, "headline");
    }
}
