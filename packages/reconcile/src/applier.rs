//! # Patch Applier
//!
//! Applies a sparse set of line-addressed changes to a document.
//!
//! The base document is flattened into slots that line up one-to-one with
//! the [`LineIndex`](redline_document::LineIndex): one slot per top-level
//! block, one slot per item of a top-level list. Every change is resolved
//! against these pre-mutation slots, so line numbers never shift while the
//! patch is applied. The edited slots are then regrouped into blocks and
//! serialized back to Markdown.

use crate::change::{Change, ChangeKind};
use redline_document::{from_markdown, to_markdown, Block, Document, ListItem};
use serde::Serialize;
use tracing::debug;

/// Document a patch is applied to
#[derive(Debug, Clone, Copy)]
pub enum Base<'a> {
    Markdown(&'a str),
    Document(&'a Document),
}

impl<'a> From<&'a str> for Base<'a> {
    fn from(markdown: &'a str) -> Self {
        Base::Markdown(markdown)
    }
}

impl<'a> From<&'a String> for Base<'a> {
    fn from(markdown: &'a String) -> Self {
        Base::Markdown(markdown)
    }
}

impl<'a> From<&'a Document> for Base<'a> {
    fn from(doc: &'a Document) -> Self {
        Base::Document(doc)
    }
}

impl Base<'_> {
    fn blocks(&self) -> Vec<Block> {
        match self {
            Base::Markdown(markdown) => from_markdown(markdown).blocks,
            Base::Document(doc) => doc.blocks.clone(),
        }
    }
}

/// What happened to one change of the set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeOutcome {
    Applied,
    /// Replace that lost to an earlier replace or to a delete of its line
    Superseded,
    /// Replace or delete of a line the document does not have
    OutOfRange,
    /// Insert whose content is blank
    Empty,
}

/// Per-change outcomes, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub outcomes: Vec<ChangeOutcome>,
}

impl ApplyReport {
    pub fn applied(&self) -> usize {
        self.count(ChangeOutcome::Applied)
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.applied()
    }

    pub fn count(&self, outcome: ChangeOutcome) -> usize {
        self.outcomes.iter().filter(|o| **o == outcome).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Bullet,
    Ordered { start: u64 },
}

impl ItemKind {
    fn same_list_kind(&self, other: &ItemKind) -> bool {
        matches!(
            (self, other),
            (ItemKind::Bullet, ItemKind::Bullet) | (ItemKind::Ordered { .. }, ItemKind::Ordered { .. })
        )
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Block(Block),
    Item {
        kind: ItemKind,
        item: ListItem,
        /// Top-level block the item came from; `None` for parsed content
        origin: Option<usize>,
    },
}

#[derive(Debug, Default)]
struct SlotEdit {
    removed: bool,
    /// Index of the winning replace change and its parsed content
    replacement: Option<(usize, Vec<Slot>)>,
    inserts_after: Vec<Vec<Slot>>,
}

/// Apply changes and return the new Markdown, or `None` when no change
/// had any effect
pub fn apply<'a>(base: impl Into<Base<'a>>, changes: &[Change]) -> Option<String> {
    apply_with_report(base, changes).0
}

/// Like [`apply`], also reporting what happened to each change
pub fn apply_with_report<'a>(
    base: impl Into<Base<'a>>,
    changes: &[Change],
) -> (Option<String>, ApplyReport) {
    let slots = to_slots(base.into().blocks(), true);
    let mut edits: Vec<SlotEdit> = slots.iter().map(|_| SlotEdit::default()).collect();
    let mut appended: Vec<(u64, Vec<Slot>)> = Vec::new();
    let mut report = ApplyReport {
        outcomes: Vec::with_capacity(changes.len()),
    };

    for (index, change) in changes.iter().enumerate() {
        let slot = change
            .line
            .checked_sub(1)
            .and_then(|slot| usize::try_from(slot).ok())
            .filter(|slot| *slot < edits.len());

        let outcome = match (change.kind, slot) {
            (ChangeKind::Replace, Some(slot)) => {
                let edit = &mut edits[slot];
                if edit.removed || edit.replacement.is_some() {
                    ChangeOutcome::Superseded
                } else {
                    edit.replacement = Some((index, parse_slots(&change.content)));
                    ChangeOutcome::Applied
                }
            }
            (ChangeKind::Delete, Some(slot)) => {
                let edit = &mut edits[slot];
                if let Some((replaced, _)) = edit.replacement.take() {
                    report.outcomes[replaced] = ChangeOutcome::Superseded;
                }
                edit.removed = true;
                ChangeOutcome::Applied
            }
            (ChangeKind::Insert, _) if change.content.trim().is_empty() => ChangeOutcome::Empty,
            (ChangeKind::Insert, Some(slot)) => {
                edits[slot].inserts_after.push(parse_slots(&change.content));
                ChangeOutcome::Applied
            }
            (ChangeKind::Insert, None) => {
                appended.push((change.line, parse_slots(&change.content)));
                ChangeOutcome::Applied
            }
            (ChangeKind::Replace | ChangeKind::Delete, None) => ChangeOutcome::OutOfRange,
        };

        if outcome != ChangeOutcome::Applied {
            debug!(
                line = change.line,
                kind = %change.kind,
                ?outcome,
                "Change had no effect"
            );
        }
        report.outcomes.push(outcome);
    }

    if report.applied() == 0 {
        debug!(changes = changes.len(), "No change resolved against the document");
        return (None, report);
    }

    appended.sort_by_key(|(line, _)| *line);

    let mut result = Vec::with_capacity(slots.len());
    for (slot, edit) in slots.into_iter().zip(edits) {
        if !edit.removed {
            match edit.replacement {
                Some((_, replacement)) => result.extend(replacement),
                None => result.push(slot),
            }
        }
        for inserted in edit.inserts_after {
            result.extend(inserted);
        }
    }
    for (_, inserted) in appended {
        result.extend(inserted);
    }

    let doc = Document::from_blocks(regroup(result));
    debug!(
        applied = report.applied(),
        skipped = report.skipped(),
        blocks = doc.blocks.len(),
        "Applied sparse patch"
    );
    (Some(to_markdown(&doc)), report)
}

/// Parse one change's content into slots. Content that yields no blocks
/// falls back to a plain paragraph of its trimmed text.
fn parse_slots(content: &str) -> Vec<Slot> {
    let text = content.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let doc = from_markdown(content);
    if doc.is_empty() {
        return vec![Slot::Block(Block::paragraph(text))];
    }
    to_slots(doc.blocks, false)
}

fn to_slots(blocks: Vec<Block>, track_origin: bool) -> Vec<Slot> {
    let mut slots = Vec::with_capacity(blocks.len());
    for (index, block) in blocks.into_iter().enumerate() {
        let origin = track_origin.then_some(index);
        match block {
            Block::BulletList { items } if !items.is_empty() => {
                slots.extend(items.into_iter().map(|item| Slot::Item {
                    kind: ItemKind::Bullet,
                    item,
                    origin,
                }));
            }
            Block::OrderedList { start, items } if !items.is_empty() => {
                slots.extend(items.into_iter().map(|item| Slot::Item {
                    kind: ItemKind::Ordered { start },
                    item,
                    origin,
                }));
            }
            other => slots.push(Slot::Block(other)),
        }
    }
    slots
}

struct ListGroup {
    kind: ItemKind,
    origin: Option<usize>,
    items: Vec<ListItem>,
}

impl ListGroup {
    fn accepts(&self, kind: &ItemKind, origin: Option<usize>) -> bool {
        self.kind.same_list_kind(kind)
            && match (self.origin, origin) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
    }

    fn into_block(self) -> Block {
        match self.kind {
            ItemKind::Bullet => Block::BulletList { items: self.items },
            ItemKind::Ordered { start } => Block::OrderedList {
                start,
                items: self.items,
            },
        }
    }
}

/// Re-form lists from consecutive item slots of one list kind
fn regroup(slots: Vec<Slot>) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(slots.len());
    let mut group: Option<ListGroup> = None;

    for slot in slots {
        match slot {
            Slot::Block(block) => {
                if let Some(group) = group.take() {
                    blocks.push(group.into_block());
                }
                blocks.push(block);
            }
            Slot::Item { kind, item, origin } => match group.as_mut() {
                Some(current) if current.accepts(&kind, origin) => {
                    current.origin = current.origin.or(origin);
                    current.items.push(item);
                }
                _ => {
                    if let Some(group) = group.take() {
                        blocks.push(group.into_block());
                    }
                    group = Some(ListGroup {
                        kind,
                        origin,
                        items: vec![item],
                    });
                }
            },
        }
    }

    if let Some(group) = group {
        blocks.push(group.into_block());
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC: &str = "A\n\nB\n\nC";

    #[test]
    fn test_replace_middle_line() {
        assert_eq!(
            apply(ABC, &[Change::replace(2, "B2")]),
            Some("A\n\nB2\n\nC".to_string())
        );
    }

    #[test]
    fn test_delete_and_insert_use_original_lines() {
        let changes = vec![Change::delete(2), Change::insert(3, "D")];
        assert_eq!(apply(ABC, &changes), Some("A\n\nC\n\nD".to_string()));
    }

    #[test]
    fn test_far_out_of_range_insert_appends() {
        let changes = vec![Change::insert(100, "Z"), Change::insert(50, "Y")];
        assert_eq!(apply("A\n\nB", &changes), Some("A\n\nB\n\nY\n\nZ".to_string()));
    }

    #[test]
    fn test_missing_lines_only_is_none() {
        let (markdown, report) =
            apply_with_report(ABC, &[Change::replace(9, "x"), Change::delete(4)]);

        assert_eq!(markdown, None);
        assert_eq!(report.count(ChangeOutcome::OutOfRange), 2);
        assert_eq!(apply(ABC, &[]), None);
    }

    #[test]
    fn test_first_replace_wins() {
        let changes = vec![Change::replace(1, "first"), Change::replace(1, "second")];
        let (markdown, report) = apply_with_report(ABC, &changes);

        assert_eq!(markdown, Some("first\n\nB\n\nC".to_string()));
        assert_eq!(
            report.outcomes,
            vec![ChangeOutcome::Applied, ChangeOutcome::Superseded]
        );
    }

    #[test]
    fn test_delete_wins_over_replace() {
        for changes in [
            vec![Change::replace(2, "B2"), Change::delete(2)],
            vec![Change::delete(2), Change::replace(2, "B2")],
        ] {
            let (markdown, report) = apply_with_report(ABC, &changes);
            assert_eq!(markdown, Some("A\n\nC".to_string()));
            assert_eq!(report.applied(), 1);
            assert_eq!(report.count(ChangeOutcome::Superseded), 1);
        }
    }

    #[test]
    fn test_inserts_after_one_line_keep_order() {
        let changes = vec![Change::insert(1, "x"), Change::insert(1, "y")];
        assert_eq!(apply(ABC, &changes), Some("A\n\nx\n\ny\n\nB\n\nC".to_string()));
    }

    #[test]
    fn test_empty_replace_removes_slot() {
        assert_eq!(apply(ABC, &[Change::replace(1, "  ")]), Some("B\n\nC".to_string()));
    }

    #[test]
    fn test_blank_insert_is_skipped() {
        let (markdown, report) = apply_with_report(ABC, &[Change::insert(1, "\n")]);
        assert_eq!(markdown, None);
        assert_eq!(report.outcomes, vec![ChangeOutcome::Empty]);
    }

    #[test]
    fn test_replace_list_item() {
        let base = "- a\n- b\n- c";
        assert_eq!(
            apply(base, &[Change::replace(2, "- B")]),
            Some("- a\n- B\n- c".to_string())
        );
    }

    #[test]
    fn test_insert_list_item_joins_list() {
        assert_eq!(
            apply("- a\n- b", &[Change::insert(1, "- x")]),
            Some("- a\n- x\n- b".to_string())
        );
    }

    #[test]
    fn test_paragraph_insert_splits_list() {
        assert_eq!(
            apply("- a\n- b", &[Change::insert(1, "Para")]),
            Some("- a\n\nPara\n\n- b".to_string())
        );
    }

    #[test]
    fn test_ordered_list_keeps_start() {
        assert_eq!(
            apply("3. a\n4. b\n5. c", &[Change::delete(1)]),
            Some("3. b\n4. c".to_string())
        );
    }

    #[test]
    fn test_separate_lists_stay_separate() {
        let base = "- a\n\n* b\n\nEnd";
        assert_eq!(
            apply(base, &[Change::replace(3, "Fin")]),
            Some("- a\n\n* b\n\nFin".to_string())
        );
    }

    #[test]
    fn test_list_kind_change_splits() {
        assert_eq!(
            apply("- a\n- b", &[Change::replace(2, "1. b")]),
            Some("- a\n\n1. b".to_string())
        );
    }

    #[test]
    fn test_insert_into_empty_document() {
        assert_eq!(
            apply("", &[Change::insert(1, "# Hello")]),
            Some("# Hello".to_string())
        );
    }

    #[test]
    fn test_document_base() {
        let doc = from_markdown("# Title\n\nBody");
        assert_eq!(
            apply(&doc, &[Change::replace(2, "New *body*")]),
            Some("# Title\n\nNew *body*".to_string())
        );
    }

    #[test]
    fn test_nested_blocks_travel_with_item() {
        let base = "- parent\n  - child\n- sibling";
        assert_eq!(
            apply(base, &[Change::delete(2)]),
            Some("- parent\n  - child".to_string())
        );
    }
}
