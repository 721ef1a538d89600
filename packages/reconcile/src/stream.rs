//! # Stream Parser
//!
//! Pulls complete change objects out of a possibly truncated JSON stream.
//!
//! The assistant emits either a bare array of changes or a wrapper object
//! whose array field carries them. While the stream is still arriving the
//! buffer is not valid JSON, so after a cheap full parse attempt the buffer
//! is scanned character by character and every object that closed inside
//! an array is parsed on its own. A trailing object that has not closed
//! yet is left out and picked up by a later scan.

use serde_json::Value;
use tracing::trace;

/// Extract change candidates using the default `elements` wrapper field
pub fn extract_objects(buffer: &str) -> Vec<Value> {
    extract_objects_with_field(buffer, "elements")
}

/// Extract change candidates, reading wrapper objects through `field`
pub fn extract_objects_with_field(buffer: &str, field: &str) -> Vec<Value> {
    let body = strip_code_fence(buffer);
    if body.is_empty() {
        return Vec::new();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(items) = payload_items(value, field) {
            return items;
        }
    }

    StreamScanner::new().push(body)
}

/// Items of a fully parsed payload: a bare array, a wrapper object holding
/// an array under `field`, or a single change object.
pub fn payload_items(value: Value, field: &str) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove(field) {
            Some(Value::Array(items)) => Some(items),
            Some(other) => {
                map.insert(field.to_string(), other);
                map.contains_key("line").then(|| vec![Value::Object(map)])
            }
            None => map.contains_key("line").then(|| vec![Value::Object(map)]),
        },
        _ => None,
    }
}

/// Remove a surrounding Markdown code fence (```` ```json ````), tolerating
/// a fence that has been opened but not yet closed.
pub fn strip_code_fence(buffer: &str) -> &str {
    let trimmed = buffer.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string line.
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => return "",
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Incremental scanner over a JSON change stream.
///
/// Objects are captured only while inside an array, so a wrapper object
/// around the array is skipped. Brackets inside a captured object do not
/// affect array depth, and braces or brackets inside string literals are
/// ignored.
#[derive(Debug, Default, Clone)]
pub struct StreamScanner {
    in_string: bool,
    escaped: bool,
    array_depth: usize,
    brace_depth: usize,
    current: String,
}

impl StreamScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk; returns the objects completed by it
    pub fn push(&mut self, chunk: &str) -> Vec<Value> {
        let mut completed = Vec::new();

        for ch in chunk.chars() {
            let capturing = self.brace_depth > 0;
            if capturing {
                self.current.push(ch);
            }

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == '"' {
                    self.in_string = false;
                }
                continue;
            }

            match ch {
                '"' => self.in_string = true,
                '[' if !capturing => self.array_depth += 1,
                ']' if !capturing => self.array_depth = self.array_depth.saturating_sub(1),
                '{' if capturing => self.brace_depth += 1,
                '{' if self.array_depth > 0 => {
                    self.brace_depth = 1;
                    self.current.clear();
                    self.current.push(ch);
                }
                '}' if capturing => {
                    self.brace_depth -= 1;
                    if self.brace_depth == 0 {
                        match serde_json::from_str::<Value>(&self.current) {
                            Ok(value) => completed.push(value),
                            Err(err) => trace!(error = %err, "Skipping unparsable stream fragment"),
                        }
                        self.current.clear();
                    }
                }
                _ => {}
            }
        }

        completed
    }

    /// True while an object has been opened but not closed
    pub fn has_partial(&self) -> bool {
        self.brace_depth > 0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
