//! # Undo/Redo Stack
//!
//! Tracks document history as before/after snapshots.
//!
//! ## Design
//!
//! - Each recorded edit keeps the document before and after it
//! - Undo restores `before` and moves the entry to the redo stack
//! - Redo restores `after`
//! - New edits clear the redo stack
//! - An assistant turn is batched: every commit of the turn collapses into
//!   one entry, so a single undo removes the whole AI edit

use crate::transaction::EditOrigin;
use chrono::{DateTime, Utc};
use redline_document::Document;

/// One undoable step
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub before: Document,
    pub after: Document,
    pub origin: EditOrigin,
    pub description: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(before: Document, after: Document, origin: EditOrigin) -> Self {
        Self {
            before,
            after,
            origin,
            description: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Undo/redo stack for a session's document
#[derive(Debug)]
pub struct UndoStack {
    /// Applied entries (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Undone entries (most recent last)
    redo_stack: Vec<HistoryEntry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Open batch description, set between `begin_batch` and `end_batch`
    batch_description: Option<String>,

    /// Entry collecting the edits of the open batch
    current_batch: Option<HistoryEntry>,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            batch_description: None,
            current_batch: None,
        }
    }

    /// Record an edit from `before` to `after`
    pub fn record(&mut self, before: &Document, after: &Document, origin: EditOrigin) {
        if self.batch_description.is_some() {
            match &mut self.current_batch {
                Some(batch) => {
                    batch.after = after.clone();
                    batch.recorded_at = Utc::now();
                }
                None => {
                    let mut entry = HistoryEntry::new(before.clone(), after.clone(), origin);
                    entry.description = self.batch_description.clone();
                    self.current_batch = Some(entry);
                }
            }
            self.redo_stack.clear();
            return;
        }

        self.push_entry(HistoryEntry::new(before.clone(), after.clone(), origin));
    }

    /// Start a batch: edits recorded until `end_batch` undo together
    pub fn begin_batch(&mut self, description: impl Into<String>) {
        self.end_batch();
        self.batch_description = Some(description.into());
    }

    /// Close the open batch and push it to the undo stack
    pub fn end_batch(&mut self) {
        self.batch_description = None;
        if let Some(batch) = self.current_batch.take() {
            if batch.before != batch.after {
                self.push_entry(batch);
            }
        }
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        // New edits invalidate the future.
        self.redo_stack.clear();
    }

    /// Undo the most recent entry; returns the document to restore
    pub fn undo(&mut self) -> Option<Document> {
        self.end_batch();
        let entry = self.undo_stack.pop()?;
        let restored = entry.before.clone();
        self.redo_stack.push(entry);
        Some(restored)
    }

    /// Redo the most recently undone entry; returns the document to restore
    pub fn redo(&mut self) -> Option<Document> {
        self.end_batch();
        let entry = self.redo_stack.pop()?;
        let restored = entry.after.clone();
        self.undo_stack.push(entry);
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || self.current_batch.is_some()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo levels, counting an open batch
    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len() + usize::from(self.current_batch.is_some())
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_description = None;
        self.current_batch = None;
    }

    /// Description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.current_batch
            .as_ref()
            .or_else(|| self.undo_stack.last())
            .and_then(|entry| entry.description.as_deref())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|entry| entry.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
