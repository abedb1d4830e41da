// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Field paths inside JSON documents
//!
//! Paths use dotted keys with bracketed numeric indices, e.g.
//! `sections[0].heading` or `hero.buttons[1].label`. A dotted numeric key
//! (`items.2`) addresses an array element when the node is an array.

use serde_json::{Map, Value};

use crate::error::{PilotError, Result};

/// One step of a parsed field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Object key
    Key(String),
    /// Array index
    Index(usize),
}

/// Parse a field path into segments
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>> {
    let path = path.trim();
    if path.is_empty() {
        return Err(PilotError::InvalidInput("field path is empty".to_string()));
    }

    let mut segments = Vec::new();
    let mut key = String::new();
    let mut chars = path.chars().peekable();
    // Set after `]`, where a following `.` must not produce an empty key.
    let mut after_index = false;

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if key.is_empty() && !after_index {
                    return Err(PilotError::InvalidInput(format!(
                        "empty segment in field path '{}'",
                        path
                    )));
                }
                if !key.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut key)));
                }
                after_index = false;
                if chars.peek().is_none() {
                    return Err(PilotError::InvalidInput(format!(
                        "field path '{}' ends with '.'",
                        path
                    )));
                }
            }
            '[' => {
                if !key.is_empty() {
                    segments.push(PathSegment::Key(std::mem::take(&mut key)));
                }
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) if d.is_ascii_digit() => digits.push(d),
                        _ => {
                            return Err(PilotError::InvalidInput(format!(
                                "invalid index in field path '{}'",
                                path
                            )))
                        }
                    }
                }
                let index = digits.parse::<usize>().map_err(|_| {
                    PilotError::InvalidInput(format!("invalid index in field path '{}'", path))
                })?;
                segments.push(PathSegment::Index(index));
                after_index = true;
            }
            ']' => {
                return Err(PilotError::InvalidInput(format!(
                    "unbalanced ']' in field path '{}'",
                    path
                )))
            }
            _ => {
                if after_index {
                    return Err(PilotError::InvalidInput(format!(
                        "expected '.' or '[' after index in field path '{}'",
                        path
                    )));
                }
                key.push(c);
            }
        }
    }

    if !key.is_empty() {
        segments.push(PathSegment::Key(key));
    }

    Ok(segments)
}

/// Render segments back into path syntax
pub fn format_path(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(index) => {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Read the value at `path`. Missing intermediates and malformed paths yield `None`.
pub fn get_value<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = parse_path(path).ok()?;
    get_segments(doc, &segments)
}

/// Read the value addressed by already-parsed segments
pub fn get_segments<'a>(doc: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    let mut node = doc;
    for segment in segments {
        node = match (segment, node) {
            (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
            (PathSegment::Key(key), Value::Array(items)) => items.get(key.parse::<usize>().ok()?)?,
            (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Return a copy of `doc` with `value` stored at `path`.
///
/// The input is never modified. Missing intermediate objects and arrays are
/// created; arrays grow (padding with `null`) only up to an explicit index.
pub fn set_value(doc: &Value, path: &str, value: Value) -> Result<Value> {
    let segments = parse_path(path)?;
    let mut updated = doc.clone();
    assign(&mut updated, &segments, value);
    Ok(updated)
}

fn assign(node: &mut Value, segments: &[PathSegment], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    match first {
        PathSegment::Key(key) => {
            if let Value::Array(items) = node {
                if let Ok(index) = key.parse::<usize>() {
                    if items.len() <= index {
                        items.resize(index + 1, Value::Null);
                    }
                    assign(&mut items[index], rest, value);
                    return;
                }
            }
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry(key.clone()).or_insert(Value::Null);
                assign(child, rest, value);
            }
        }
        PathSegment::Index(index) => {
            if !node.is_array() {
                *node = Value::Array(Vec::new());
            }
            if let Value::Array(items) = node {
                if items.len() <= *index {
                    items.resize(index + 1, Value::Null);
                }
                assign(&mut items[*index], rest, value);
            }
        }
    }
}
