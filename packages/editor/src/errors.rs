//! Error types for the editor

use crate::transaction::TurnId;
use redline_document::DocumentError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Turn {turn} is stale (current turn is {current})")]
    StaleTurn { turn: TurnId, current: TurnId },

    #[error("Unknown message part type: {0}")]
    UnknownPart(String),

    #[error("Malformed message part: {0}")]
    InvalidPart(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("No suggestion to accept")]
    NoSuggestion,

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
}
