// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Append-only conversation log
//!
//! Messages are kept per (site_id, locale, conversation_id) in arrival order.
//! Arrival order is the only ordering guarantee; one request handles one
//! conversation sequentially.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{PilotError, Result};

/// Parse a DateTime from a database RFC3339 string
fn parse_datetime_from_db(
    timestamp: &str,
    column: usize,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

/// Author of a persisted message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(MessageRole::User),
            "assistant" => Some(MessageRole::Assistant),
            "tool" => Some(MessageRole::Tool),
            _ => None,
        }
    }
}

/// One persisted conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageRecord {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl ChatMessageRecord {
    /// New record stamped with a fresh id and the current time
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            tool_name: None,
        }
    }

    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = Some(tool_name.into());
        self
    }
}

/// Persistence boundary for conversation history
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The most recent `limit` messages, oldest first
    async fn load_conversation(
        &self,
        site_id: &str,
        locale: &str,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessageRecord>>;

    /// Append one message
    async fn save_message(
        &self,
        site_id: &str,
        locale: &str,
        conversation_id: &str,
        message: &ChatMessageRecord,
    ) -> Result<()>;
}

/// SQLite conversation log
pub struct SqliteConversationStore {
    conn: Mutex<Connection>,
}

impl SqliteConversationStore {
    /// Open or create the conversation log at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| PilotError::Storage(format!("Failed to open conversation store: {}", e)))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory log
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PilotError::Storage("conversation store lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                site_id TEXT NOT NULL,
                locale TEXT NOT NULL,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                tool_name TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_conversation
            ON chat_messages(site_id, locale, conversation_id, seq)",
            [],
        )?;
        Ok(())
    }

    /// Total number of stored messages across all conversations
    pub fn message_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chat_messages", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Conversation ids for a site and locale, most recently active first
    pub fn list_conversations(&self, site_id: &str, locale: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT conversation_id FROM chat_messages
            WHERE site_id = ?1 AND locale = ?2
            GROUP BY conversation_id
            ORDER BY MAX(seq) DESC",
        )?;
        let ids = stmt
            .query_map(params![site_id, locale], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn load_conversation(
        &self,
        site_id: &str,
        locale: &str,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<ChatMessageRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, role, content, tool_name, created_at FROM chat_messages
            WHERE site_id = ?1 AND locale = ?2 AND conversation_id = ?3
            ORDER BY seq DESC
            LIMIT ?4",
        )?;

        let rows = stmt
            .query_map(
                params![site_id, locale, conversation_id, limit as i64],
                |row| {
                    let id: String = row.get(0)?;
                    let role: String = row.get(1)?;
                    let created_at: String = row.get(4)?;
                    Ok((id, role, row.get::<_, String>(2)?, row.get(3)?, created_at))
                },
            )?
            .collect::<std::result::Result<Vec<(String, String, String, Option<String>, String)>, _>>()?;

        let mut messages = Vec::with_capacity(rows.len());
        for (id, role, content, tool_name, created_at) in rows.into_iter().rev() {
            let Some(role) = MessageRole::parse(&role) else {
                tracing::warn!(
                    target: "sitepilot.conversation",
                    role = %role,
                    "skipping message with unknown role"
                );
                continue;
            };
            messages.push(ChatMessageRecord {
                id: Uuid::parse_str(&id)
                    .map_err(|e| PilotError::Storage(format!("bad message id '{}': {}", id, e)))?,
                role,
                content,
                created_at: parse_datetime_from_db(&created_at, 4)?,
                tool_name,
            });
        }
        Ok(messages)
    }

    async fn save_message(
        &self,
        site_id: &str,
        locale: &str,
        conversation_id: &str,
        message: &ChatMessageRecord,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO chat_messages
            (id, site_id, locale, conversation_id, role, content, tool_name, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                message.id.to_string(),
                site_id,
                locale,
                conversation_id,
                message.role.as_str(),
                &message.content,
                &message.tool_name,
                message.created_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }
}
