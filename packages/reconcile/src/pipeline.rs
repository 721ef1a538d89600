//! # Reconcile Pipeline
//!
//! Raw stream text → candidates → validated, deduplicated changes →
//! classification → Markdown.
//!
//! The pipeline is synchronous and side-effect free. Callers re-run it from
//! scratch on every stream chunk; duplicates yielded by re-parsing the
//! growing buffer are removed by dedupe.

use crate::applier::{apply_with_report, ApplyReport, Base};
use crate::change::{dedupe, validate, Change};
use crate::classify::{classify, join_sequential, PatchKind};
use crate::options::ReconcileOptions;
use crate::stream::extract_objects_with_field;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Everything one pipeline run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    pub kind: PatchKind,
    pub changes: Vec<Change>,
    /// New document Markdown, `None` when nothing changed
    pub markdown: Option<String>,
    /// Per-change outcomes for sparse patches
    pub report: Option<ApplyReport>,
}

/// Configured entry point to the pipeline
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ReconcileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReconcileOptions {
        &self.options
    }

    /// Parse, validate and dedupe the changes in a raw stream buffer
    #[instrument(skip_all, fields(bytes = raw.len()))]
    pub fn parse(&self, raw: &str) -> Vec<Change> {
        if raw.len() > self.options.max_buffer_bytes {
            warn!(
                bytes = raw.len(),
                limit = self.options.max_buffer_bytes,
                "Stream buffer exceeds limit, ignoring"
            );
            return Vec::new();
        }

        let candidates = extract_objects_with_field(raw, &self.options.payload_field);
        let changes = dedupe(validate(&candidates));
        debug!(
            candidates = candidates.len(),
            changes = changes.len(),
            "Parsed stream buffer"
        );
        changes
    }

    pub fn classify(&self, changes: &[Change]) -> PatchKind {
        if self.options.allow_sequential_rewrite {
            classify(changes)
        } else {
            PatchKind::SparsePatch
        }
    }

    /// Run the pipeline; `None` means the document is unchanged
    pub fn reconcile<'a>(&self, base: impl Into<Base<'a>>, raw: &str) -> Option<String> {
        self.reconcile_detailed(base, raw).markdown
    }

    #[instrument(skip_all, fields(bytes = raw.len()))]
    pub fn reconcile_detailed<'a>(&self, base: impl Into<Base<'a>>, raw: &str) -> Reconciliation {
        let changes = self.parse(raw);
        let kind = self.classify(&changes);

        let (markdown, report) = match kind {
            PatchKind::SequentialInsert => {
                let markdown = join_sequential(&changes);
                ((!markdown.trim().is_empty()).then_some(markdown), None)
            }
            PatchKind::SparsePatch => {
                let (markdown, report) = apply_with_report(base, &changes);
                (markdown, Some(report))
            }
        };

        info!(
            %kind,
            changes = changes.len(),
            changed = markdown.is_some(),
            "Reconcile complete"
        );

        Reconciliation {
            kind,
            changes,
            markdown,
            report,
        }
    }
}

/// Reconcile with default options
pub fn reconcile<'a>(base: impl Into<Base<'a>>, raw: &str) -> Option<String> {
    Reconciler::new().reconcile(base, raw)
}
