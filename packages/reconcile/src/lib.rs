//! # Redline Reconcile
//!
//! Merges streamed, line-addressed AI edits into a Markdown document.
//!
//! ```text
//! raw stream ─► stream::extract_objects ─► change::validate ─► change::dedupe
//!            ─► classify::classify ─┬─► join_sequential      (full rewrite)
//!                                   └─► applier::apply       (sparse patch)
//! ```

pub mod applier;
pub mod change;
pub mod classify;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod stream;

pub use applier::{apply, apply_with_report, ApplyReport, Base, ChangeOutcome};
pub use change::{dedupe, validate, validate_payload, Change, ChangeKind};
pub use classify::{classify, join_sequential, looks_like_list_item, PatchKind};
pub use error::ValidationError;
pub use options::ReconcileOptions;
pub use pipeline::{reconcile, Reconciler, Reconciliation};
pub use stream::{extract_objects, extract_objects_with_field, StreamScanner};
