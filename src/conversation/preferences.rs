// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Free-form editing preferences per site and locale

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{PilotError, Result};

/// A stored preference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub key: String,
    pub value: String,
}

/// Preference persistence
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// All preferences for a site and locale, ordered by key
    async fn list(&self, site_id: &str, locale: &str) -> Result<Vec<Preference>>;

    /// Insert or replace one preference
    async fn set(&self, site_id: &str, locale: &str, key: &str, value: &str) -> Result<()>;
}

/// SQLite preference table
pub struct SqlitePreferenceStore {
    conn: Mutex<Connection>,
}

impl SqlitePreferenceStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| PilotError::Storage(format!("Failed to open preference store: {}", e)))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                site_id TEXT NOT NULL,
                locale TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (site_id, locale, key)
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PilotError::Storage("preference store lock poisoned".to_string()))
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    async fn list(&self, site_id: &str, locale: &str) -> Result<Vec<Preference>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, value FROM preferences
            WHERE site_id = ?1 AND locale = ?2
            ORDER BY key",
        )?;
        let prefs = stmt
            .query_map(params![site_id, locale], |row| {
                Ok(Preference {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(prefs)
    }

    async fn set(&self, site_id: &str, locale: &str, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(PilotError::InvalidInput(
                "preference key must not be empty".to_string(),
            ));
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO preferences (site_id, locale, key, value, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (site_id, locale, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![site_id, locale, key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
