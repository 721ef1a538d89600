use serde::{Deserialize, Serialize};
use std::fmt;

/// Progress of one assistant action stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Processing,
    Streaming,
    Complete,
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamStatus::Processing => f.write_str("processing"),
            StreamStatus::Streaming => f.write_str("streaming"),
            StreamStatus::Complete => f.write_str("complete"),
        }
    }
}

/// Document progress envelope; `markdown` is the full document so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status: StreamStatus,
    #[serde(default)]
    pub markdown: String,
}

/// Title progress envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status: StreamStatus,
    #[serde(default)]
    pub title: String,
}
