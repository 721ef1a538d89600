//! # Redline Editor
//!
//! Per-session editing engine for documents co-written with an assistant.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document: Markdown ⇄ Document, line index   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ reconcile: change stream → new Markdown     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: session state + single dispatch     │
//! │  - Turn ids cancel stale assistant work     │
//! │  - Stream activity per action class         │
//! │  - Suggestions, undo/redo                   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **One entry point**: every edit is a `Transaction` passed to `dispatch`
//! 2. **Base snapshots**: a turn's line numbers always refer to the document
//!    as it was when the turn began
//! 3. **Last write wins per turn**: commits from an older turn are dropped
//!
//! ## Usage
//!
//! ```rust,ignore
//! use redline_editor::{EditSession, MessagePart};
//!
//! let mut session = EditSession::from_markdown("doc-1", "# Notes\n\nDraft");
//! let context = session.line_indexed(LineFormat::Markdown);
//!
//! let turn = session.begin_turn();
//! for chunk in model_stream {
//!     session.push_chunk(turn, &chunk)?;
//! }
//! session.finish_turn(turn);
//! ```

mod activity;
mod document;
mod errors;
mod message;
mod session;
mod status;
mod suggestion;
mod transaction;
mod undo_stack;

pub use activity::{ActionClass, Activities, StreamActivity};
pub use document::LiveDocument;
pub use errors::EditorError;
pub use message::MessagePart;
pub use session::{EditSession, PendingPatch};
pub use status::{EditorStatus, StreamStatus, TitleStatus};
pub use suggestion::{Suggestion, SuggestionState};
pub use transaction::{CommitOutcome, EditOrigin, Transaction, TurnId};
pub use undo_stack::{HistoryEntry, UndoStack};

// Re-export common types for convenience
pub use redline_document::{Document, LineFormat};
pub use redline_reconcile::ReconcileOptions;
