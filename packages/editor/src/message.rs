//! # Message Parts
//!
//! Typed view of the parts an assistant message is streamed as. The set is
//! closed; hosts route each part with an exhaustive match.

use crate::errors::EditorError;
use crate::status::{EditorStatus, TitleStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const KNOWN_PARTS: &[&str] = &[
    "text",
    "reasoning",
    "editor-status",
    "title-status",
    "document-edit",
    "source",
    "error",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text {
        text: String,
    },
    Reasoning {
        text: String,
    },
    EditorStatus(EditorStatus),
    TitleStatus(TitleStatus),
    /// Raw line-addressed change stream text
    DocumentEdit {
        text: String,
    },
    Source {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Error {
        message: String,
    },
}

impl MessagePart {
    /// Convert an untyped JSON part. Unknown kinds are reported separately
    /// from malformed known kinds so hosts can ignore the former.
    pub fn from_value(value: Value) -> Result<Self, EditorError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| EditorError::InvalidPart("missing `type`".to_string()))?;

        if !KNOWN_PARTS.contains(&kind) {
            return Err(EditorError::UnknownPart(kind.to_string()));
        }

        serde_json::from_value(value).map_err(|err| EditorError::InvalidPart(err.to_string()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MessagePart::Text { .. } => "text",
            MessagePart::Reasoning { .. } => "reasoning",
            MessagePart::EditorStatus(_) => "editor-status",
            MessagePart::TitleStatus(_) => "title-status",
            MessagePart::DocumentEdit { .. } => "document-edit",
            MessagePart::Source { .. } => "source",
            MessagePart::Error { .. } => "error",
        }
    }
}
