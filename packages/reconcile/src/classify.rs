//! # Patch Classifier
//!
//! Decides whether a validated change set rebuilds the whole document or
//! patches it in place.
//!
//! A set of inserts covering lines `1..=N` exactly is the assistant writing
//! the document from scratch; its contents are joined in line order. Any
//! other set is a sparse patch resolved against the base document.

use crate::change::{Change, ChangeKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static LIST_ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([-*+]\s|\d+\.\s)").unwrap());

/// How a validated change set is turned into Markdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchKind {
    /// Inserts at lines 1..=N: the document is rebuilt from the contents
    SequentialInsert,
    /// Anything else: changes are applied against the current document
    SparsePatch,
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchKind::SequentialInsert => f.write_str("sequential-insert"),
            PatchKind::SparsePatch => f.write_str("sparse-patch"),
        }
    }
}

pub fn classify(changes: &[Change]) -> PatchKind {
    if changes.is_empty() || changes.iter().any(|c| c.kind != ChangeKind::Insert) {
        return PatchKind::SparsePatch;
    }

    let mut lines: Vec<u64> = changes.iter().map(|c| c.line).collect();
    lines.sort_unstable();

    let contiguous = lines
        .iter()
        .enumerate()
        .all(|(i, line)| *line == i as u64 + 1);

    if contiguous {
        PatchKind::SequentialInsert
    } else {
        PatchKind::SparsePatch
    }
}

/// True when Markdown content starts like a list item
pub fn looks_like_list_item(content: &str) -> bool {
    LIST_ITEM_RE.is_match(content)
}

/// Rebuild a document from sequential inserts, in line order
pub fn join_sequential(changes: &[Change]) -> String {
    let mut ordered: Vec<&Change> = changes.iter().collect();
    ordered.sort_by_key(|c| c.line);

    let mut output = String::new();
    let mut previous_is_item = false;

    for (i, change) in ordered.iter().enumerate() {
        let is_item = looks_like_list_item(&change.content);
        if i > 0 {
            output.push_str(if previous_is_item && is_item { "\n" } else { "\n\n" });
        }
        output.push_str(&change.content);
        previous_is_item = is_item;
    }

    output
}
