//! # Transactions
//!
//! Every change to a session's state is described by a [`Transaction`] and
//! applied through `EditSession::dispatch`, which gives all edits a single
//! total order.

use redline_document::Document;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic per-session generation counter. Work tagged with an older
/// turn is stale and never committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TurnId(pub u64);

impl TurnId {
    pub fn next(self) -> Self {
        TurnId(self.0 + 1)
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a document replacement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOrigin {
    /// Typed by the user; cancels any assistant work in flight
    User,
    /// Reconciled assistant output for one turn
    Assistant { turn: TurnId },
    /// Undo or redo
    History,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    ReplaceDocument { document: Document, origin: EditOrigin },
    SetSuggestion { line: usize, text: String },
    ClearSuggestion,
    AcceptSuggestion,
    Undo,
    Redo,
}

impl Transaction {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Transaction::ReplaceDocument { .. } => "replace_document",
            Transaction::SetSuggestion { .. } => "set_suggestion",
            Transaction::ClearSuggestion => "clear_suggestion",
            Transaction::AcceptSuggestion => "accept_suggestion",
            Transaction::Undo => "undo",
            Transaction::Redo => "redo",
        }
    }
}

/// Result of a dispatched transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// The document changed and is now at `version`
    Applied { version: u64 },
    /// The work belonged to a turn that is no longer current
    Stale,
    /// Nothing about the document changed
    Unchanged,
}

impl CommitOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, CommitOutcome::Applied { .. })
    }
}
