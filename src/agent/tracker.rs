// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Duplicate tool-call detection for one turn loop

use std::collections::HashSet;

use serde_json::Value;

/// Remembers every `(name, args)` pair executed in the current turn loop
#[derive(Debug, Default)]
pub struct ToolCallTracker {
    seen: HashSet<(String, String)>,
}

impl ToolCallTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact signature of a call. Object keys serialize in sorted order, so
    /// key order in the provider payload does not matter.
    pub fn signature(tool_name: &str, args: &Value) -> (String, String) {
        let args = if args.is_null() {
            "{}".to_string()
        } else {
            serde_json::to_string(args).unwrap_or_default()
        };
        (tool_name.to_string(), args)
    }

    /// Record a call; returns false when the same call was already recorded
    pub fn track(&mut self, tool_name: &str, args: &Value) -> bool {
        self.seen.insert(Self::signature(tool_name, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_call_is_duplicate() {
        let mut tracker = ToolCallTracker::new();
        let args = json!({"page": "home", "field_path": "headline", "new_value": "A"});
        assert!(tracker.track("update_page_field", &args));
        assert!(!tracker.track("update_page_field", &args));
        assert!(tracker.track("update_page_field", &json!({"page": "home"})));
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let mut tracker = ToolCallTracker::new();
        let a: Value = serde_json::from_str(r#"{"page":"home","field_path":"x"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"field_path":"x","page":"home"}"#).unwrap();
        assert!(tracker.track("read_page", &a));
        assert!(!tracker.track("read_page", &b));
    }

    #[test]
    fn test_different_args_or_name_are_novel() {
        let mut tracker = ToolCallTracker::new();
        assert!(tracker.track("read_page", &json!({"page": "home"})));
        assert!(tracker.track("read_page", &json!({"page": "about"})));
        assert!(tracker.track("list_pages", &json!({"page": "home"})));
    }

    #[test]
    fn test_null_args_equal_empty_object() {
        let mut tracker = ToolCallTracker::new();
        assert!(tracker.track("list_pages", &Value::Null));
        assert!(!tracker.track("list_pages", &json!({})));
    }
}
