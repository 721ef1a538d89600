use serde::{Deserialize, Serialize};

/// Default size cap for one turn's stream buffer (1 MiB)
pub const DEFAULT_MAX_BUFFER_BYTES: usize = 1024 * 1024;

/// Tunables for the reconcile pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcileOptions {
    /// Array field of a wrapper object that carries the changes
    pub payload_field: String,
    /// Treat an all-insert 1..=N change set as a full rewrite
    pub allow_sequential_rewrite: bool,
    /// Stream buffers larger than this are rejected
    pub max_buffer_bytes: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            payload_field: "elements".to_string(),
            allow_sequential_rewrite: true,
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
        }
    }
}
