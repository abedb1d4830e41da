// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Access policy for tools
//!
//! The executor consults a policy before running any mutating tool. Denials
//! surface as `PermissionDenied` errors whose text starts with "forbidden",
//! which the engine tags as an auth failure.

use std::collections::HashSet;

use crate::error::{PilotError, Result};

use super::ToolContext;

/// Decides whether an actor may run a tool
pub trait AccessPolicy: Send + Sync {
    /// Return `Ok(())` to allow the call
    fn check(&self, ctx: &ToolContext, tool_name: &str, mutating: bool) -> Result<()>;
}

/// Allows everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn check(&self, _ctx: &ToolContext, _tool_name: &str, _mutating: bool) -> Result<()> {
        Ok(())
    }
}

/// Allows reads only
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOnly;

impl AccessPolicy for ReadOnly {
    fn check(&self, ctx: &ToolContext, tool_name: &str, mutating: bool) -> Result<()> {
        if mutating {
            return Err(forbidden(ctx, tool_name));
        }
        Ok(())
    }
}

/// Allows writes only for listed actor emails (case-insensitive)
#[derive(Debug, Clone, Default)]
pub struct EditorAllowList {
    editors: HashSet<String>,
}

impl EditorAllowList {
    pub fn new<I, S>(editors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            editors: editors
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .collect(),
        }
    }
}

impl AccessPolicy for EditorAllowList {
    fn check(&self, ctx: &ToolContext, tool_name: &str, mutating: bool) -> Result<()> {
        if mutating && !self.editors.contains(&ctx.actor_email.trim().to_lowercase()) {
            return Err(forbidden(ctx, tool_name));
        }
        Ok(())
    }
}

fn forbidden(ctx: &ToolContext, tool_name: &str) -> PilotError {
    PilotError::PermissionDenied(format!(
        "forbidden: {} may not run {} on site {}",
        ctx.actor_email, tool_name, ctx.site_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(actor: &str) -> ToolContext {
        ToolContext::new("s1", "en", actor)
    }

    #[test]
    fn test_allow_all() {
        assert!(AllowAll.check(&ctx("a@x.com"), "update_page_field", true).is_ok());
    }

    #[test]
    fn test_read_only_blocks_writes() {
        assert!(ReadOnly.check(&ctx("a@x.com"), "read_page", false).is_ok());
        let err = ReadOnly
            .check(&ctx("a@x.com"), "update_page_field", true)
            .unwrap_err();
        assert!(matches!(err, PilotError::PermissionDenied(_)));
        assert!(err.to_string().contains("forbidden"));
    }

    #[test]
    fn test_editor_allow_list() {
        let policy = EditorAllowList::new(["Editor@Example.com"]);
        assert!(policy.check(&ctx("editor@example.com"), "create_entity", true).is_ok());
        assert!(policy.check(&ctx("viewer@example.com"), "create_entity", true).is_err());
        assert!(policy.check(&ctx("viewer@example.com"), "list_pages", false).is_ok());
    }
}
