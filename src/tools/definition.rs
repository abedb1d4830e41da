// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Tool schemas
//!
//! Tools describe their arguments as a JSON-schema object. The same schema
//! is sent to the model and checked against incoming arguments before a
//! handler runs.

use serde_json::{json, Value};

use crate::error::{PilotError, Result};
use crate::llm::provider::ToolInputSchema;

/// Helper to create a tool input schema
pub struct SchemaBuilder {
    properties: serde_json::Map<String, Value>,
    required: Vec<String>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            properties: serde_json::Map::new(),
            required: vec![],
        }
    }

    fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    /// Add a string property
    pub fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({ "type": "string", "description": description }),
            required,
        )
    }

    /// Add a string property restricted to a fixed set of values
    pub fn enumeration(self, name: &str, description: &str, values: &[&str], required: bool) -> Self {
        self.property(
            name,
            json!({ "type": "string", "description": description, "enum": values }),
            required,
        )
    }

    /// Add an integer property
    pub fn integer(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({ "type": "integer", "description": description }),
            required,
        )
    }

    /// Add a boolean property
    pub fn boolean(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({ "type": "boolean", "description": description }),
            required,
        )
    }

    /// Add an object property
    pub fn object(self, name: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            json!({ "type": "object", "description": description }),
            required,
        )
    }

    /// Add an untyped property (any JSON value)
    pub fn any(self, name: &str, description: &str, required: bool) -> Self {
        self.property(name, json!({ "description": description }), required)
    }

    /// Build the schema
    pub fn build(self) -> ToolInputSchema {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties: Value::Object(self.properties),
            required: self.required,
        }
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

/// Check arguments against a tool's schema
///
/// Missing arguments (JSON null) are treated as an empty object. Required
/// properties must be present and non-null; declared types and enums are
/// enforced. Unknown extra properties are allowed.
pub fn validate_args(tool: &str, schema: &ToolInputSchema, args: &Value) -> Result<Value> {
    let args = match args {
        Value::Null => Value::Object(serde_json::Map::new()),
        Value::Object(_) => args.clone(),
        other => {
            return Err(PilotError::InvalidInput(format!(
                "{}: arguments must be an object, got {}",
                tool, other
            )))
        }
    };

    for name in &schema.required {
        if args.get(name).map_or(true, Value::is_null) {
            return Err(PilotError::InvalidInput(format!(
                "{}: missing required argument '{}'",
                tool, name
            )));
        }
    }

    if let Some(properties) = schema.properties.as_object() {
        for (name, prop) in properties {
            let Some(value) = args.get(name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if let Some(expected) = prop.get("type").and_then(Value::as_str) {
                if !type_matches(expected, value) {
                    return Err(PilotError::InvalidInput(format!(
                        "{}: argument '{}' must be of type {}",
                        tool, name, expected
                    )));
                }
            }
            if let Some(allowed) = prop.get("enum").and_then(Value::as_array) {
                if !allowed.contains(value) {
                    return Err(PilotError::InvalidInput(format!(
                        "{}: argument '{}' must be one of {}",
                        tool,
                        name,
                        Value::Array(allowed.clone())
                    )));
                }
            }
        }
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ToolInputSchema {
        SchemaBuilder::new()
            .string("page", "Page slug", true)
            .integer("limit", "Max results", false)
            .boolean("confirm", "Confirm", false)
            .enumeration("kind", "Kind", &["image", "video"], false)
            .any("new_value", "Value", false)
            .build()
    }

    #[test]
    fn test_builder_collects_required() {
        let schema = schema();
        assert_eq!(schema.required, vec!["page"]);
        assert_eq!(schema.properties["limit"]["type"], "integer");
        assert!(schema.properties["new_value"].get("type").is_none());
    }

    #[test]
    fn test_validate_accepts_good_args() {
        let args = json!({"page": "home", "limit": 3, "new_value": {"any": "thing"}});
        assert_eq!(validate_args("t", &schema(), &args).unwrap(), args);
    }

    #[test]
    fn test_validate_missing_required() {
        let err = validate_args("t", &schema(), &json!({"limit": 1})).unwrap_err();
        assert!(err.to_string().contains("missing required argument 'page'"));

        let err = validate_args("t", &schema(), &json!({"page": null})).unwrap_err();
        assert!(matches!(err, PilotError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_null_args_as_empty_object() {
        let empty = SchemaBuilder::new().build();
        assert_eq!(validate_args("t", &empty, &Value::Null).unwrap(), json!({}));
        assert!(validate_args("t", &schema(), &Value::Null).is_err());
    }

    #[test]
    fn test_validate_type_mismatch() {
        let err = validate_args("t", &schema(), &json!({"page": 5})).unwrap_err();
        assert!(err.to_string().contains("type string"));

        let err = validate_args("t", &schema(), &json!({"page": "a", "limit": "3"})).unwrap_err();
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn test_validate_enum() {
        assert!(validate_args("t", &schema(), &json!({"page": "a", "kind": "image"})).is_ok());
        assert!(validate_args("t", &schema(), &json!({"page": "a", "kind": "audio"})).is_err());
    }

    #[test]
    fn test_validate_rejects_non_object() {
        assert!(validate_args("t", &schema(), &json!(["page"])).is_err());
    }
}
