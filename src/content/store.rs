// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Content store
//!
//! [`ContentStore`] is the only persistence interface the agent core uses.
//! [`DualContentStore`] keeps the SQLite document table authoritative, mirrors
//! documents to JSON files on a best-effort basis, and syncs file-backed
//! collection entities into their dedicated tables.
//!
//! The backends are not transactional: a failed mirror or dedicated-table
//! write after a successful DB upsert is logged and the write still succeeds.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::Settings;
use crate::content::catalog::CatalogConfig;
use crate::content::media::normalize_media_urls;
use crate::content::mirror::FileMirror;
use crate::content::sqlite::SqliteDocuments;
use crate::error::{PilotError, Result};
use crate::tools::ToolContext;

/// A document together with its logical path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    pub path: String,
    pub content: Value,
}

/// Persistence boundary for JSON content documents
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read one document; `None` when it does not exist
    async fn read(&self, ctx: &ToolContext, path: &str) -> Result<Option<Value>>;

    /// Write one document and return the normalized value that was (or, on
    /// dry-run, would have been) stored
    async fn write(&self, ctx: &ToolContext, path: &str, doc: Value) -> Result<Value>;

    /// Delete one document from every backend
    async fn remove(&self, ctx: &ToolContext, path: &str) -> Result<()>;

    /// All documents whose logical path starts with `prefix`, ordered by path
    async fn list_by_prefix(&self, ctx: &ToolContext, prefix: &str) -> Result<Vec<StoredDocument>>;
}

/// Reject paths outside the addressable document set
pub fn validate_document_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(PilotError::InvalidInput(format!(
            "document path '{}' {}",
            path, reason
        )))
    };
    if path.is_empty() {
        return invalid("is empty");
    }
    if !path.ends_with(".json") {
        return invalid("must end with .json");
    }
    if path.starts_with('/') || path.contains('\\') {
        return invalid("must be a relative logical path");
    }
    if path.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return invalid("contains an empty or relative segment");
    }
    Ok(())
}

/// Database-primary store with a file mirror and dedicated-table sync
pub struct DualContentStore {
    db: Option<SqliteDocuments>,
    mirror: FileMirror,
    catalog: CatalogConfig,
    write_through: bool,
    media_base_url: Option<String>,
}

impl DualContentStore {
    /// Create a store. Without a database the mirror becomes the primary backend.
    pub fn new(db: Option<SqliteDocuments>, mirror: FileMirror, catalog: CatalogConfig) -> Self {
        Self {
            db,
            mirror,
            catalog,
            write_through: true,
            media_base_url: None,
        }
    }

    /// Set whether successful DB writes are mirrored to files
    pub fn with_write_through(mut self, enabled: bool) -> Self {
        self.write_through = enabled;
        self
    }

    /// Set the public media origin stripped during URL normalization
    pub fn with_media_base_url(mut self, url: Option<String>) -> Self {
        self.media_base_url = url;
        self
    }

    /// Build from settings, opening the configured database
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let tables = settings.catalog.dedicated_tables();
        let db = settings
            .storage
            .database_path
            .as_ref()
            .map(|path| SqliteDocuments::open(path, &tables))
            .transpose()?;
        Ok(Self::new(
            db,
            FileMirror::new(&settings.storage.mirror_root),
            settings.catalog.clone(),
        )
        .with_write_through(settings.storage.write_through_enabled())
        .with_media_base_url(settings.media.public_base_url.clone()))
    }

    /// Database backend, if configured
    pub fn database(&self) -> Option<&SqliteDocuments> {
        self.db.as_ref()
    }

    /// File mirror backend
    pub fn mirror(&self) -> &FileMirror {
        &self.mirror
    }

    /// Whether the file mirror receives writes
    fn mirrors_writes(&self) -> bool {
        self.db.is_none() || self.write_through
    }

    /// Make a collection entity carry the slug of its address, and an id
    fn enforce_collection_identity(&self, path: &str, doc: Value) -> Value {
        let Some((_, slug)) = self.catalog.collection_for_path(path) else {
            return doc;
        };
        let Value::Object(mut map) = doc else {
            return doc;
        };
        map.insert("slug".to_string(), Value::String(slug.to_string()));
        let missing_id = map
            .get("id")
            .map(|id| id.is_null() || id.as_str().is_some_and(str::is_empty))
            .unwrap_or(true);
        if missing_id {
            map.insert("id".to_string(), Value::String(slug.to_string()));
        }
        Value::Object(map)
    }
}

#[async_trait]
impl ContentStore for DualContentStore {
    async fn read(&self, ctx: &ToolContext, path: &str) -> Result<Option<Value>> {
        validate_document_path(path)?;

        if let Some(db) = &self.db {
            match db.get(&ctx.site_id, &ctx.locale, path) {
                Ok(Some(doc)) => return Ok(Some(doc)),
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    target: "sitepilot.content.store",
                    site = %ctx.site_id,
                    locale = %ctx.locale,
                    path = %path,
                    error = %e,
                    "database read failed, falling back to file mirror"
                ),
            }
        }

        self.mirror.read(&ctx.site_id, &ctx.locale, path)
    }

    async fn write(&self, ctx: &ToolContext, path: &str, doc: Value) -> Result<Value> {
        validate_document_path(path)?;

        let normalized = normalize_media_urls(&doc, self.media_base_url.as_deref());
        let normalized = self.enforce_collection_identity(path, normalized);

        if ctx.dry_run {
            tracing::debug!(
                target: "sitepilot.content.store",
                site = %ctx.site_id,
                path = %path,
                "dry-run write skipped"
            );
            return Ok(normalized);
        }

        if let Some(db) = &self.db {
            db.upsert(&ctx.site_id, &ctx.locale, path, &normalized, &ctx.actor_email)?;

            if let Some((table, slug)) = self.catalog.dedicated_table_for_path(path) {
                if let Err(e) = db.upsert_dedicated(
                    table,
                    &ctx.site_id,
                    &ctx.locale,
                    slug,
                    &normalized,
                    &ctx.actor_email,
                ) {
                    tracing::warn!(
                        target: "sitepilot.content.store",
                        site = %ctx.site_id,
                        path = %path,
                        table = %table,
                        error = %e,
                        "dedicated table sync failed"
                    );
                }
            }

            if self.write_through {
                if let Err(e) = self.mirror.write(&ctx.site_id, &ctx.locale, path, &normalized) {
                    tracing::warn!(
                        target: "sitepilot.content.store",
                        site = %ctx.site_id,
                        path = %path,
                        error = %e,
                        "file mirror write failed"
                    );
                }
            }
        } else {
            self.mirror
                .write(&ctx.site_id, &ctx.locale, path, &normalized)?;
        }

        tracing::debug!(
            target: "sitepilot.content.store",
            site = %ctx.site_id,
            locale = %ctx.locale,
            path = %path,
            actor = %ctx.actor_email,
            "document written"
        );
        Ok(normalized)
    }

    async fn remove(&self, ctx: &ToolContext, path: &str) -> Result<()> {
        validate_document_path(path)?;

        if ctx.dry_run {
            return Ok(());
        }

        if let Some(db) = &self.db {
            db.delete(&ctx.site_id, &ctx.locale, path)?;

            if let Some((table, slug)) = self.catalog.dedicated_table_for_path(path) {
                if let Err(e) = db.delete_dedicated(table, &ctx.site_id, slug) {
                    tracing::warn!(
                        target: "sitepilot.content.store",
                        site = %ctx.site_id,
                        path = %path,
                        table = %table,
                        error = %e,
                        "dedicated table delete failed"
                    );
                }
            }
        }

        match self.mirror.remove(&ctx.site_id, &ctx.locale, path) {
            Ok(_) => {}
            Err(e) if self.db.is_none() => return Err(e),
            Err(e) => tracing::warn!(
                target: "sitepilot.content.store",
                site = %ctx.site_id,
                path = %path,
                error = %e,
                "file mirror delete failed"
            ),
        }

        tracing::debug!(
            target: "sitepilot.content.store",
            site = %ctx.site_id,
            path = %path,
            "document removed"
        );
        Ok(())
    }

    async fn list_by_prefix(&self, ctx: &ToolContext, prefix: &str) -> Result<Vec<StoredDocument>> {
        let mut documents: BTreeMap<String, Value> = BTreeMap::new();

        if let Some(db) = &self.db {
            match db.list(&ctx.site_id, &ctx.locale, prefix) {
                Ok(rows) => documents.extend(rows),
                Err(e) => tracing::warn!(
                    target: "sitepilot.content.store",
                    site = %ctx.site_id,
                    prefix = %prefix,
                    error = %e,
                    "database list failed, using file mirror only"
                ),
            }
        }

        for (path, content) in self.mirror.list(&ctx.site_id, &ctx.locale, prefix)? {
            documents.entry(path).or_insert(content);
        }

        Ok(documents
            .into_iter()
            .map(|(path, content)| StoredDocument { path, content })
            .collect())
    }
}
