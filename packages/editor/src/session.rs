//! # Edit Session
//!
//! Single-threaded owner of one document and everything that edits it.
//!
//! All state changes go through [`EditSession::dispatch`]. Assistant work is
//! tagged with the [`TurnId`] it was started under; user edits, undo and
//! `new_chat` advance the turn, so anything still in flight for an older
//! turn is rejected as stale at commit time instead of overwriting newer
//! content.

use crate::activity::{ActionClass, Activities, StreamActivity};
use crate::document::LiveDocument;
use crate::errors::EditorError;
use crate::message::MessagePart;
use crate::status::{EditorStatus, StreamStatus, TitleStatus};
use crate::suggestion::{Suggestion, SuggestionState};
use crate::transaction::{CommitOutcome, EditOrigin, Transaction, TurnId};
use crate::undo_stack::UndoStack;
use redline_document::{append_text, from_markdown, Block, Document, DocumentError, LineFormat};
use redline_reconcile::{ReconcileOptions, Reconciler};
use tracing::{debug, info, warn};

/// Reconciled assistant output waiting to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPatch {
    pub turn: TurnId,
    pub markdown: String,
}

pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    live: LiveDocument,
    turn: TurnId,

    /// Document the current turn's line numbers refer to
    turn_base: Option<Document>,

    /// Accumulated change stream of the current turn
    buffer: String,

    reconciler: Reconciler,
    activities: Activities,
    suggestion: SuggestionState,
    history: UndoStack,
    title: Option<String>,
}

impl EditSession {
    /// Create a session over an empty document
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_document(id, Document::new())
    }

    pub fn from_markdown(id: impl Into<String>, markdown: &str) -> Self {
        Self::with_document(id, from_markdown(markdown))
    }

    pub fn with_document(id: impl Into<String>, document: Document) -> Self {
        Self {
            id: id.into(),
            live: LiveDocument::new(document),
            turn: TurnId::default(),
            turn_base: None,
            buffer: String::new(),
            reconciler: Reconciler::new(),
            activities: Activities::default(),
            suggestion: SuggestionState::default(),
            history: UndoStack::new(),
            title: None,
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.reconciler = Reconciler::with_options(options);
        self
    }

    pub fn turn(&self) -> TurnId {
        self.turn
    }

    pub fn version(&self) -> u64 {
        self.live.version()
    }

    pub fn document(&self) -> &Document {
        self.live.document()
    }

    pub fn markdown(&self) -> String {
        self.live.markdown()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn suggestion(&self) -> Option<&Suggestion> {
        self.suggestion.current()
    }

    pub fn activity(&self, class: ActionClass) -> StreamActivity {
        self.activities.get(class)
    }

    /// True while any assistant stream is active
    pub fn is_busy(&self) -> bool {
        self.activities.is_busy()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Addressing context for the assistant, numbered like the line index
    pub fn line_indexed(&self, format: LineFormat) -> String {
        self.live.render(format)
    }

    /// Start an assistant generation turn
    pub fn begin_turn(&mut self) -> TurnId {
        self.turn = self.turn.next();
        self.open_stream();
        self.activities
            .transition(ActionClass::Editor, self.turn, StreamStatus::Processing, self.turn);
        info!(session = %self.id, turn = %self.turn, "Turn started");
        self.turn
    }

    /// Mark the turn's document stream as finished
    pub fn finish_turn(&mut self, turn: TurnId) {
        self.activities
            .transition(ActionClass::Editor, turn, StreamStatus::Complete, self.turn);
        if turn == self.turn {
            self.history.end_batch();
            self.turn_base = None;
        }
    }

    /// Reset conversational state; pending assistant work becomes stale
    pub fn new_chat(&mut self) {
        self.cancel_pending();
        self.title = None;
        info!(session = %self.id, turn = %self.turn, "New chat");
    }

    /// Run the pipeline for `turn` against the turn's base document
    pub fn prepare(&self, turn: TurnId, raw: &str) -> Result<Option<PendingPatch>, EditorError> {
        self.ensure_current(turn)?;
        let base = self.turn_base.as_ref().unwrap_or_else(|| self.live.document());
        Ok(self
            .reconciler
            .reconcile(base, raw)
            .map(|markdown| PendingPatch { turn, markdown }))
    }

    /// Commit a prepared patch if its turn is still current
    pub fn commit(&mut self, pending: PendingPatch) -> Result<CommitOutcome, EditorError> {
        self.dispatch(Transaction::ReplaceDocument {
            document: from_markdown(&pending.markdown),
            origin: EditOrigin::Assistant { turn: pending.turn },
        })
    }

    /// Append streamed change text for `turn` and commit the re-run result
    pub fn push_chunk(&mut self, turn: TurnId, chunk: &str) -> Result<CommitOutcome, EditorError> {
        if turn != self.turn {
            debug!(session = %self.id, turn = %turn, current = %self.turn, "Ignoring chunk for stale turn");
            return Ok(CommitOutcome::Stale);
        }

        if self.turn_base.is_none() {
            debug!(session = %self.id, turn = %turn, "First chunk without begin_turn, snapshotting base");
            self.open_stream();
        }

        self.buffer.push_str(chunk);
        self.activities
            .transition(ActionClass::Editor, turn, StreamStatus::Streaming, self.turn);

        match self.prepare(turn, &self.buffer)? {
            Some(pending) => self.commit(pending),
            None => Ok(CommitOutcome::Unchanged),
        }
    }

    /// Apply a full-document status envelope
    pub fn apply_editor_status(
        &mut self,
        turn: TurnId,
        status: EditorStatus,
    ) -> Result<CommitOutcome, EditorError> {
        self.activities
            .transition(ActionClass::Editor, turn, status.status, self.turn);
        if turn != self.turn {
            return Ok(CommitOutcome::Stale);
        }

        let outcome = if status.status == StreamStatus::Processing || status.markdown.trim().is_empty() {
            CommitOutcome::Unchanged
        } else {
            self.commit(PendingPatch {
                turn,
                markdown: status.markdown,
            })?
        };

        if status.status == StreamStatus::Complete {
            self.finish_turn(turn);
        }
        Ok(outcome)
    }

    /// Apply a title status envelope
    pub fn apply_title_status(&mut self, turn: TurnId, status: TitleStatus) -> CommitOutcome {
        self.activities
            .transition(ActionClass::Title, turn, status.status, self.turn);
        if turn != self.turn {
            return CommitOutcome::Stale;
        }

        if !status.title.trim().is_empty() {
            self.title = Some(status.title.trim().to_string());
        }
        CommitOutcome::Unchanged
    }

    /// Route one streamed message part
    pub fn handle_part(&mut self, turn: TurnId, part: MessagePart) -> Result<CommitOutcome, EditorError> {
        match part {
            MessagePart::Text { .. } | MessagePart::Reasoning { .. } | MessagePart::Source { .. } => {
                Ok(CommitOutcome::Unchanged)
            }
            MessagePart::EditorStatus(status) => self.apply_editor_status(turn, status),
            MessagePart::TitleStatus(status) => Ok(self.apply_title_status(turn, status)),
            MessagePart::DocumentEdit { text } => self.push_chunk(turn, &text),
            MessagePart::Error { message } => {
                warn!(session = %self.id, turn = %turn, %message, "Assistant stream failed");
                self.activities
                    .transition(ActionClass::Editor, turn, StreamStatus::Complete, self.turn);
                self.activities
                    .transition(ActionClass::Title, turn, StreamStatus::Complete, self.turn);
                if turn == self.turn {
                    self.history.end_batch();
                }
                Ok(CommitOutcome::Unchanged)
            }
        }
    }

    pub fn set_suggestion(&mut self, line: usize, text: impl Into<String>) -> Result<CommitOutcome, EditorError> {
        self.dispatch(Transaction::SetSuggestion {
            line,
            text: text.into(),
        })
    }

    pub fn accept_suggestion(&mut self) -> Result<CommitOutcome, EditorError> {
        self.dispatch(Transaction::AcceptSuggestion)
    }

    /// Replace the document with user-authored Markdown
    pub fn user_edit(&mut self, markdown: &str) -> Result<CommitOutcome, EditorError> {
        self.dispatch(Transaction::ReplaceDocument {
            document: from_markdown(markdown),
            origin: EditOrigin::User,
        })
    }

    pub fn undo(&mut self) -> Result<CommitOutcome, EditorError> {
        self.dispatch(Transaction::Undo)
    }

    pub fn redo(&mut self) -> Result<CommitOutcome, EditorError> {
        self.dispatch(Transaction::Redo)
    }

    /// Single entry point for every state change
    pub fn dispatch(&mut self, transaction: Transaction) -> Result<CommitOutcome, EditorError> {
        debug!(session = %self.id, transaction = transaction.name(), "Dispatch");

        match transaction {
            Transaction::ReplaceDocument { document, origin } => self.replace_document(document, origin),
            Transaction::SetSuggestion { line, text } => {
                let len = self.live.line_index().len();
                // An empty document accepts a suggestion for its first line.
                let in_range = line >= 1 && (line <= len || (len == 0 && line == 1));
                if !in_range {
                    return Err(DocumentError::line_out_of_range(line, len).into());
                }
                self.suggestion.set(Suggestion {
                    line,
                    text,
                    version: self.live.version(),
                });
                Ok(CommitOutcome::Unchanged)
            }
            Transaction::ClearSuggestion => {
                self.suggestion.clear();
                Ok(CommitOutcome::Unchanged)
            }
            Transaction::AcceptSuggestion => {
                let suggestion = self.suggestion.take().ok_or(EditorError::NoSuggestion)?;
                let mut document = self.live.document().clone();
                if document.is_empty() {
                    document.blocks.push(Block::paragraph(suggestion.text));
                } else {
                    append_text(&mut document, suggestion.line, &suggestion.text)?;
                }
                self.replace_document(document, EditOrigin::User)
            }
            Transaction::Undo => {
                let document = self.history.undo().ok_or(EditorError::NothingToUndo)?;
                self.replace_document(document, EditOrigin::History)
            }
            Transaction::Redo => {
                let document = self.history.redo().ok_or(EditorError::NothingToRedo)?;
                self.replace_document(document, EditOrigin::History)
            }
        }
    }

    fn replace_document(&mut self, document: Document, origin: EditOrigin) -> Result<CommitOutcome, EditorError> {
        match origin {
            EditOrigin::Assistant { turn } if turn != self.turn => {
                debug!(session = %self.id, turn = %turn, current = %self.turn, "Rejecting stale commit");
                return Ok(CommitOutcome::Stale);
            }
            EditOrigin::Assistant { .. } => {}
            EditOrigin::User | EditOrigin::History => self.cancel_pending(),
        }

        self.suggestion.clear();
        if document == *self.live.document() {
            return Ok(CommitOutcome::Unchanged);
        }

        let previous = self.live.replace(document);
        if origin != EditOrigin::History {
            self.history.record(&previous, self.live.document(), origin);
        }

        let version = self.live.version();
        debug!(session = %self.id, version, ?origin, "Document replaced");
        Ok(CommitOutcome::Applied { version })
    }

    /// Snapshot the document the stream's line numbers refer to
    fn open_stream(&mut self) {
        self.turn_base = Some(self.live.document().clone());
        self.buffer.clear();
        self.history.begin_batch(format!("Assistant turn {}", self.turn));
    }

    /// Advance the turn so in-flight assistant work becomes stale
    fn cancel_pending(&mut self) {
        self.turn = self.turn.next();
        self.turn_base = None;
        self.buffer.clear();
        self.activities.reset();
        self.suggestion.clear();
        self.history.end_batch();
    }

    fn ensure_current(&self, turn: TurnId) -> Result<(), EditorError> {
        if turn == self.turn {
            Ok(())
        } else {
            Err(EditorError::StaleTurn {
                turn,
                current: self.turn,
            })
        }
    }
}
