// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! SQLite document table and dedicated entity tables
//!
//! `content_documents` holds every JSON document keyed by
//! (site_id, locale, path). Each dedicated table mirrors one collection kind
//! keyed by (site_id, slug) for query-heavy consumers.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::content::catalog::is_valid_table_name;
use crate::error::{PilotError, Result};

/// SQLite-backed document storage
pub struct SqliteDocuments {
    conn: Mutex<Connection>,
}

impl SqliteDocuments {
    /// Open or create the document database at the given path
    pub fn open<P: AsRef<Path>>(path: P, dedicated_tables: &[&str]) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .map_err(|e| PilotError::Storage(format!("Failed to open content database: {}", e)))?;
        Self::from_connection(conn, dedicated_tables)
    }

    /// Create an in-memory database (tests, previews)
    pub fn in_memory(dedicated_tables: &[&str]) -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, dedicated_tables)
    }

    /// Wrap an existing connection and initialize the schema
    pub fn from_connection(conn: Connection, dedicated_tables: &[&str]) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema(dedicated_tables)?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PilotError::Storage("content database lock poisoned".to_string()))
    }

    fn init_schema(&self, dedicated_tables: &[&str]) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS content_documents (
                site_id TEXT NOT NULL,
                locale TEXT NOT NULL,
                path TEXT NOT NULL,
                content TEXT NOT NULL,
                updated_by TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (site_id, locale, path)
            )",
            [],
        )?;

        for table in dedicated_tables {
            let table = checked_table(table)?;
            conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {table} (
                        site_id TEXT NOT NULL,
                        slug TEXT NOT NULL,
                        locale TEXT NOT NULL,
                        entity_id TEXT,
                        content TEXT NOT NULL,
                        updated_by TEXT NOT NULL,
                        updated_at TEXT NOT NULL,
                        PRIMARY KEY (site_id, slug)
                    )"
                ),
                [],
            )?;
        }

        Ok(())
    }

    /// Fetch one document
    pub fn get(&self, site_id: &str, locale: &str, path: &str) -> Result<Option<Value>> {
        let conn = self.conn()?;
        let content: Option<String> = conn
            .query_row(
                "SELECT content FROM content_documents
                WHERE site_id = ?1 AND locale = ?2 AND path = ?3",
                params![site_id, locale, path],
                |row| row.get(0),
            )
            .optional()?;

        content
            .map(|text| serde_json::from_str(&text).map_err(PilotError::from))
            .transpose()
    }

    /// Insert or replace one document
    pub fn upsert(
        &self,
        site_id: &str,
        locale: &str,
        path: &str,
        doc: &Value,
        actor: &str,
    ) -> Result<()> {
        let content = serde_json::to_string(doc)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO content_documents (site_id, locale, path, content, updated_by, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (site_id, locale, path) DO UPDATE SET
                content = excluded.content,
                updated_by = excluded.updated_by,
                updated_at = excluded.updated_at",
            params![
                site_id,
                locale,
                path,
                content,
                actor,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Delete one document; returns whether a row existed
    pub fn delete(&self, site_id: &str, locale: &str, path: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM content_documents WHERE site_id = ?1 AND locale = ?2 AND path = ?3",
            params![site_id, locale, path],
        )?;
        Ok(removed > 0)
    }

    /// All documents whose path starts with `prefix`, ordered by path
    pub fn list(&self, site_id: &str, locale: &str, prefix: &str) -> Result<Vec<(String, Value)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT path, content FROM content_documents
            WHERE site_id = ?1 AND locale = ?2 AND substr(path, 1, length(?3)) = ?3
            ORDER BY path",
        )?;

        let rows = stmt
            .query_map(params![site_id, locale, prefix], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut documents = Vec::with_capacity(rows.len());
        for (path, content) in rows {
            match serde_json::from_str(&content) {
                Ok(value) => documents.push((path, value)),
                Err(e) => tracing::warn!(
                    target: "sitepilot.content.sqlite",
                    site = %site_id,
                    path = %path,
                    error = %e,
                    "skipping unparseable document"
                ),
            }
        }
        Ok(documents)
    }

    /// Insert or replace the dedicated-table row for an entity
    pub fn upsert_dedicated(
        &self,
        table: &str,
        site_id: &str,
        locale: &str,
        slug: &str,
        doc: &Value,
        actor: &str,
    ) -> Result<()> {
        let table = checked_table(table)?;
        let content = serde_json::to_string(doc)?;
        let entity_id = doc.get("id").map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO {table} (site_id, slug, locale, entity_id, content, updated_by, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT (site_id, slug) DO UPDATE SET
                    locale = excluded.locale,
                    entity_id = excluded.entity_id,
                    content = excluded.content,
                    updated_by = excluded.updated_by,
                    updated_at = excluded.updated_at"
            ),
            params![
                site_id,
                slug,
                locale,
                entity_id,
                content,
                actor,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Delete the dedicated-table row for an entity
    ///
    /// Rows are keyed by site and slug only. Removing the entity's document
    /// in one locale drops the row even if another locale still has it.
    pub fn delete_dedicated(&self, table: &str, site_id: &str, slug: &str) -> Result<bool> {
        let table = checked_table(table)?;
        let conn = self.conn()?;
        let removed = conn.execute(
            &format!("DELETE FROM {table} WHERE site_id = ?1 AND slug = ?2"),
            params![site_id, slug],
        )?;
        Ok(removed > 0)
    }

    /// Read the dedicated-table row for an entity
    pub fn get_dedicated(&self, table: &str, site_id: &str, slug: &str) -> Result<Option<Value>> {
        let table = checked_table(table)?;
        let conn = self.conn()?;
        let content: Option<String> = conn
            .query_row(
                &format!("SELECT content FROM {table} WHERE site_id = ?1 AND slug = ?2"),
                params![site_id, slug],
                |row| row.get(0),
            )
            .optional()?;
        content
            .map(|text| serde_json::from_str(&text).map_err(PilotError::from))
            .transpose()
    }

    /// Number of stored documents for a site and locale
    pub fn count(&self, site_id: &str, locale: &str) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM content_documents WHERE site_id = ?1 AND locale = ?2",
            params![site_id, locale],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn checked_table(table: &str) -> Result<&str> {
    if is_valid_table_name(table) {
        Ok(table)
    } else {
        Err(PilotError::Storage(format!(
            "Invalid dedicated table name '{}'",
            table
        )))
    }
}
