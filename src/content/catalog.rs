// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Content catalog
//!
//! Describes which logical paths hold pages, which directories are typed
//! collections, which collections live inside one aggregate document, and
//! which collections are mirrored into a dedicated table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog of addressable content kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Logical prefix under which page documents live
    #[serde(default = "default_pages_prefix")]
    pub pages_prefix: String,

    /// Typed entity collections
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionDef>,

    /// Allowed variants per section type
    #[serde(default = "default_section_variants")]
    pub section_variants: BTreeMap<String, Vec<String>>,

    /// Extra friendly-name synonyms, keyed by the canonical field name
    #[serde(default)]
    pub field_aliases: BTreeMap<String, Vec<String>>,
}

/// A typed entity collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDef {
    /// Collection name used in tool arguments (e.g. "agents")
    pub name: String,

    /// Where entities of this collection are stored
    pub storage: CollectionStorage,

    /// Dedicated table kept in sync for file-backed collections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedicated_table: Option<String>,

    /// Field used to derive a slug and a display label
    #[serde(default = "default_label_field")]
    pub label_field: String,
}

/// Storage layout of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionStorage {
    /// One document per entity at `<dir>/<slug>.json`
    Files { dir: String },
    /// All entities in one document, as an array under `array_key`
    Aggregate { path: String, array_key: String },
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            pages_prefix: default_pages_prefix(),
            collections: default_collections(),
            section_variants: default_section_variants(),
            field_aliases: BTreeMap::new(),
        }
    }
}

impl CatalogConfig {
    /// Look up a collection by name; a trailing "s" may be omitted
    pub fn collection(&self, name: &str) -> Option<&CollectionDef> {
        let wanted = name.trim().to_lowercase();
        self.collections
            .iter()
            .find(|c| c.name == wanted)
            .or_else(|| {
                self.collections
                    .iter()
                    .find(|c| c.name.strip_suffix('s') == Some(wanted.as_str()))
            })
    }

    /// Names of all configured collections
    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.name.as_str()).collect()
    }

    /// Logical path of a page document
    pub fn page_path(&self, slug: &str) -> String {
        format!("{}{}.json", self.pages_prefix, slug)
    }

    /// Page slug for a logical page path
    pub fn page_slug<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.pages_prefix.as_str())?
            .strip_suffix(".json")
    }

    /// File-backed collection and slug addressed by a logical path
    pub fn collection_for_path<'a>(&self, path: &'a str) -> Option<(&CollectionDef, &'a str)> {
        let (dir, file) = path.split_once('/')?;
        if file.contains('/') {
            return None;
        }
        let slug = file.strip_suffix(".json")?;
        if slug.is_empty() {
            return None;
        }
        self.collections
            .iter()
            .find(|c| matches!(&c.storage, CollectionStorage::Files { dir: d } if d == dir))
            .map(|c| (c, slug))
    }

    /// Dedicated table and slug for a logical path, when one is configured
    pub fn dedicated_table_for_path<'a>(&self, path: &'a str) -> Option<(&str, &'a str)> {
        let (collection, slug) = self.collection_for_path(path)?;
        collection
            .dedicated_table
            .as_deref()
            .map(|table| (table, slug))
    }

    /// All dedicated table names
    pub fn dedicated_tables(&self) -> Vec<&str> {
        self.collections
            .iter()
            .filter_map(|c| c.dedicated_table.as_deref())
            .collect()
    }

    /// Allowed variants for a section type, if the type is known
    pub fn allowed_variants(&self, section_type: &str) -> Option<&[String]> {
        self.section_variants
            .get(section_type)
            .map(|variants| variants.as_slice())
    }
}

/// Whether a name is safe to use as an SQL table identifier
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Normalize free text into a URL slug
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_dash = true;
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn default_pages_prefix() -> String {
    "pages/".to_string()
}

fn default_label_field() -> String {
    "name".to_string()
}

fn default_collections() -> Vec<CollectionDef> {
    vec![
        CollectionDef {
            name: "agents".to_string(),
            storage: CollectionStorage::Files {
                dir: "agents".to_string(),
            },
            dedicated_table: Some("agent_profiles".to_string()),
            label_field: "name".to_string(),
        },
        CollectionDef {
            name: "listings".to_string(),
            storage: CollectionStorage::Files {
                dir: "listings".to_string(),
            },
            dedicated_table: Some("listings".to_string()),
            label_field: "title".to_string(),
        },
        CollectionDef {
            name: "testimonials".to_string(),
            storage: CollectionStorage::Aggregate {
                path: "collections/testimonials.json".to_string(),
                array_key: "items".to_string(),
            },
            dedicated_table: None,
            label_field: "author".to_string(),
        },
        CollectionDef {
            name: "faqs".to_string(),
            storage: CollectionStorage::Aggregate {
                path: "collections/faqs.json".to_string(),
                array_key: "items".to_string(),
            },
            dedicated_table: None,
            label_field: "question".to_string(),
        },
    ]
}

fn default_section_variants() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 5] = [
        (
            "hero",
            &["centered", "split", "image-left", "image-right", "video"],
        ),
        ("features", &["grid", "list", "alternating"]),
        ("testimonials", &["carousel", "grid", "single"]),
        ("cta", &["banner", "card", "inline"]),
        ("gallery", &["masonry", "grid", "slider"]),
    ];
    table
        .iter()
        .map(|(section, variants)| {
            (
                section.to_string(),
                variants.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect()
}
