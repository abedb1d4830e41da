// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Write-intent detection and tool failure tags

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether the user text asks for a mutation
pub fn is_write_intent(text: &str) -> bool {
    static WRITE_VERBS: OnceLock<Regex> = OnceLock::new();
    let regex = WRITE_VERBS.get_or_init(|| {
        Regex::new(
            r"(?i)\b(update|updated|updating|change|changed|changing|set|add|adding|remove|removing|delete|deleting|create|creating|rename|renaming|replace|edit|modify|make)\b",
        )
        .expect("write-intent regex is valid")
    });
    regex.is_match(text)
}

/// Informational tag attached to a failed tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureTag {
    InvalidVariant,
    FieldPathError,
    AuthError,
    ToolError,
}

impl FailureTag {
    /// Classify from the error text and the call's arguments
    pub fn classify(error: &str, args: &Value) -> Self {
        let lower = error.to_lowercase();
        if lower.contains("variant") {
            FailureTag::InvalidVariant
        } else if lower.contains("path") || args.get("field_path").is_some() {
            FailureTag::FieldPathError
        } else if lower.contains("forbidden")
            || lower.contains("not authenticated")
            || lower.contains("unauthenticated")
            || lower.contains("permission denied")
        {
            FailureTag::AuthError
        } else {
            FailureTag::ToolError
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureTag::InvalidVariant => "invalid_variant",
            FailureTag::FieldPathError => "field_path_error",
            FailureTag::AuthError => "auth_error",
            FailureTag::ToolError => "tool_error",
        }
    }
}

impl std::fmt::Display for FailureTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_intent_verbs() {
        assert!(is_write_intent("Please update the homepage headline"));
        assert!(is_write_intent("Change the phone number to 555"));
        assert!(is_write_intent("DELETE the agent Jane"));
        assert!(is_write_intent("rename the about page"));
        assert!(!is_write_intent("What does the homepage say?"));
        assert!(!is_write_intent("show me the settings"));
    }

    #[test]
    fn test_write_intent_is_word_based() {
        assert!(!is_write_intent("The sunset looks great"));
        assert!(!is_write_intent("our updates page"));
    }

    #[test]
    fn test_classify_variant() {
        let tag = FailureTag::classify("Invalid variant 'x' for hero section", &json!({}));
        assert_eq!(tag, FailureTag::InvalidVariant);
    }

    #[test]
    fn test_classify_field_path() {
        assert_eq!(
            FailureTag::classify("empty segment in field path 'a..b'", &json!({})),
            FailureTag::FieldPathError
        );
        assert_eq!(
            FailureTag::classify("page 'x' not found", &json!({"field_path": "headline"})),
            FailureTag::FieldPathError
        );
    }

    #[test]
    fn test_classify_auth_and_default() {
        assert_eq!(
            FailureTag::classify("Permission denied: forbidden", &json!({})),
            FailureTag::AuthError
        );
        assert_eq!(FailureTag::classify("boom", &json!({})), FailureTag::ToolError);
        assert_eq!(FailureTag::ToolError.to_string(), "tool_error");
    }
}
