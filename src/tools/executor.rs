// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool execution
//!
//! Looks a tool up by name, validates its arguments, applies the access
//! policy and runs it. Handler errors are returned to the caller unchanged.

use serde_json::Value;
use std::sync::Arc;

use crate::error::{PilotError, Result};
use crate::llm::provider::ToolDefinition;

use super::{validate_args, AccessPolicy, AllowAll, ToolContext, ToolRegistry, ToolResult, ToolServices};

/// Dispatches tool calls against a registry
pub struct ToolExecutor {
    registry: ToolRegistry,
    services: ToolServices,
    policy: Arc<dyn AccessPolicy>,
}

impl ToolExecutor {
    /// Create a new executor with an allow-all policy
    pub fn new(registry: ToolRegistry, services: ToolServices) -> Self {
        Self {
            registry,
            services,
            policy: Arc::new(AllowAll),
        }
    }

    /// Replace the access policy
    pub fn with_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Get tool definitions for the LLM
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Get the shared services
    pub fn services(&self) -> &ToolServices {
        &self.services
    }

    /// Execute one named tool call
    pub async fn execute(&self, ctx: &ToolContext, name: &str, args: &Value) -> Result<ToolResult> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| PilotError::ToolExecution(format!("Unknown tool: {}", name)))?
            .clone();

        let definition = tool.definition();
        let args = validate_args(name, &definition.input_schema, args)?;

        self.policy.check(ctx, name, tool.is_mutating())?;

        tracing::debug!(
            target: "sitepilot.tools.executor",
            tool = name,
            site = %ctx.site_id,
            locale = %ctx.locale,
            dry_run = ctx.dry_run,
            "executing tool"
        );

        match tool.execute(&args, ctx, &self.services).await {
            Ok(result) => {
                tracing::info!(
                    target: "sitepilot.tools.executor",
                    tool = name,
                    ok = result.ok,
                    changed = result.changed_paths.len(),
                    "tool finished"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(
                    target: "sitepilot.tools.executor",
                    tool = name,
                    error = %e,
                    "tool failed"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::test_support::services_with_docs;
    use crate::tools::ReadOnly;
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_tool() {
        let (services, _dir) = services_with_docs(&[]).await;
        let executor = ToolExecutor::new(ToolRegistry::with_builtins(), services);
        let ctx = ToolContext::new("s1", "en", "a@example.com");
        let err = executor.execute(&ctx, "format_disk", &json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Tool execution failed: Unknown tool: format_disk");
    }

    #[tokio::test]
    async fn test_schema_checked_before_handler() {
        let (services, _dir) = services_with_docs(&[]).await;
        let executor = ToolExecutor::new(ToolRegistry::with_builtins(), services);
        let ctx = ToolContext::new("s1", "en", "a@example.com");
        let err = executor
            .execute(&ctx, "read_page", &json!({"field_path": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_read_only_policy() {
        let (services, _dir) =
            services_with_docs(&[("pages/home.json", json!({"headline": "Hi"}))]).await;
        let executor = ToolExecutor::new(ToolRegistry::with_builtins(), services)
            .with_policy(Arc::new(ReadOnly));
        let ctx = ToolContext::new("s1", "en", "viewer@example.com");

        let read = executor
            .execute(&ctx, "read_page", &json!({"page": "home"}))
            .await
            .unwrap();
        assert!(read.ok);

        let err = executor
            .execute(
                &ctx,
                "update_page_field",
                &json!({"page": "home", "field_path": "headline", "new_value": "x"}),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("forbidden"));
    }

    #[tokio::test]
    async fn test_definitions_exposed() {
        let (services, _dir) = services_with_docs(&[]).await;
        let executor = ToolExecutor::new(ToolRegistry::with_builtins(), services);
        assert_eq!(executor.tool_definitions().len(), 19);
    }
}
