// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! JSON file mirror
//!
//! Documents are stored as pretty-printed JSON at
//! `<root>/<site_id>/<locale>/<path>`.

use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{PilotError, Result};

/// File-system mirror of content documents
#[derive(Debug, Clone)]
pub struct FileMirror {
    root: PathBuf,
}

impl FileMirror {
    /// Create a mirror rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the mirror
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_dir(&self, site_id: &str, locale: &str) -> Result<PathBuf> {
        for (label, value) in [("site id", site_id), ("locale", locale)] {
            if value.is_empty()
                || value == "."
                || value == ".."
                || value.contains('/')
                || value.contains('\\')
            {
                return Err(PilotError::InvalidInput(format!(
                    "invalid {}: '{}'",
                    label, value
                )));
            }
        }
        Ok(self.root.join(site_id).join(locale))
    }

    /// Absolute file path for a logical document path
    pub fn file_path(&self, site_id: &str, locale: &str, path: &str) -> Result<PathBuf> {
        Ok(self.scope_dir(site_id, locale)?.join(path))
    }

    /// Read a document; a missing file is `None`
    pub fn read(&self, site_id: &str, locale: &str, path: &str) -> Result<Option<Value>> {
        let file = self.file_path(site_id, locale, path)?;
        match std::fs::read_to_string(&file) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a document, replacing any previous file atomically
    pub fn write(&self, site_id: &str, locale: &str, path: &str, doc: &Value) -> Result<()> {
        let file = self.file_path(site_id, locale, path)?;
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(doc)?;
        let tmp = file.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &file)?;
        Ok(())
    }

    /// Delete a document; returns whether a file existed
    pub fn remove(&self, site_id: &str, locale: &str, path: &str) -> Result<bool> {
        let file = self.file_path(site_id, locale, path)?;
        match std::fs::remove_file(&file) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// All documents whose logical path starts with `prefix`, ordered by path
    pub fn list(&self, site_id: &str, locale: &str, prefix: &str) -> Result<Vec<(String, Value)>> {
        let scope = self.scope_dir(site_id, locale)?;
        if !scope.exists() {
            return Ok(Vec::new());
        }

        let mut documents = Vec::new();
        for entry in WalkDir::new(&scope)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&scope) else {
                continue;
            };
            let logical = relative.to_string_lossy().replace('\\', "/");
            if !logical.ends_with(".json") || !logical.starts_with(prefix) {
                continue;
            }
            let parsed = std::fs::read_to_string(entry.path())
                .map_err(PilotError::from)
                .and_then(|content| serde_json::from_str(&content).map_err(PilotError::from));
            match parsed {
                Ok(value) => documents.push((logical, value)),
                Err(e) => tracing::warn!(
                    target: "sitepilot.content.mirror",
                    path = %entry.path().display(),
                    error = %e,
                    "skipping unreadable mirror file"
                ),
            }
        }

        documents.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(documents)
    }
}
