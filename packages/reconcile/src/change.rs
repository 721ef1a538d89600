//! # Changes
//!
//! Typed line-addressed edits, validation of raw JSON candidates and
//! order-preserving deduplication.

use crate::error::ValidationError;
use crate::stream::payload_items;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Replace,
    Delete,
    Insert,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Replace => "replace",
            ChangeKind::Delete => "delete",
            ChangeKind::Insert => "insert",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(ChangeKind::Replace),
            "delete" => Ok(ChangeKind::Delete),
            "insert" => Ok(ChangeKind::Insert),
            other => Err(ValidationError::UnknownType(other.to_string())),
        }
    }
}

/// One line-addressed edit. `content` is the Markdown of one logical block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Change {
    pub line: u64,
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub content: String,
}

impl Change {
    pub fn replace(line: u64, content: impl Into<String>) -> Self {
        Self {
            line,
            kind: ChangeKind::Replace,
            content: content.into(),
        }
    }

    pub fn delete(line: u64) -> Self {
        Self {
            line,
            kind: ChangeKind::Delete,
            content: String::new(),
        }
    }

    pub fn insert(line: u64, content: impl Into<String>) -> Self {
        Self {
            line,
            kind: ChangeKind::Insert,
            content: content.into(),
        }
    }

    /// Validate one raw candidate object
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

        let line = obj.get("line").ok_or(ValidationError::MissingField("line"))?;
        let line = line
            .as_u64()
            .filter(|line| *line >= 1)
            .ok_or_else(|| ValidationError::InvalidLine(line.to_string()))?;

        let kind = obj.get("type").ok_or(ValidationError::MissingField("type"))?;
        let kind: ChangeKind = match kind.as_str() {
            Some(kind) => kind.parse()?,
            None => return Err(ValidationError::UnknownType(kind.to_string())),
        };

        let content = match (kind, obj.get("content")) {
            (_, Some(Value::String(content))) => content.clone(),
            (ChangeKind::Delete, _) => String::new(),
            (_, None) => return Err(ValidationError::MissingField("content")),
            (_, Some(_)) => return Err(ValidationError::ContentNotString),
        };

        Ok(Self { line, kind, content })
    }
}

/// Keep the candidates that form valid changes, in input order
pub fn validate(values: &[Value]) -> Vec<Change> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match Change::from_value(value) {
            Ok(change) => Some(change),
            Err(err) => {
                debug!(index, error = %err, "Dropping invalid change candidate");
                None
            }
        })
        .collect()
}

/// Validate a fully parsed payload: a bare array, a wrapper object holding
/// the array under `field`, or a single change object.
pub fn validate_payload(value: &Value, field: &str) -> Vec<Change> {
    match payload_items(value.clone(), field) {
        Some(items) => validate(&items),
        None => {
            debug!(field, "Payload carries no change array");
            Vec::new()
        }
    }
}

/// Remove later duplicates of `(line, type, content)`, keeping first-seen order
pub fn dedupe(changes: Vec<Change>) -> Vec<Change> {
    let mut seen = HashSet::with_capacity(changes.len());
    changes
        .into_iter()
        .filter(|change| seen.insert(change.clone()))
        .collect()
}
