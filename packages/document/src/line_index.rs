//! # Line Index
//!
//! Maps 1-based line numbers onto addressable slots of a document.
//!
//! Every top-level block gets one line in rendering order. A top-level list
//! is expanded so each of its direct items gets its own line. Blocks nested
//! in list items or blockquotes travel with their slot and are never
//! numbered separately.

use crate::ast::*;
use crate::error::{DocumentError, DocumentResult};
use crate::serializer::Serializer;

/// Position of one addressable slot inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRef {
    Block { block: usize },
    ListItem { block: usize, item: usize },
}

impl SlotRef {
    pub fn block(&self) -> usize {
        match self {
            SlotRef::Block { block } | SlotRef::ListItem { block, .. } => *block,
        }
    }
}

/// Borrowed view of the node a line points at
#[derive(Debug, Clone, Copy)]
pub enum SlotView<'a> {
    Block(&'a Block),
    ListItem {
        list: &'a Block,
        item: &'a ListItem,
        /// Item number for ordered lists
        ordinal: Option<u64>,
    },
}

impl SlotView<'_> {
    pub fn kind(&self) -> BlockKind {
        match self {
            SlotView::Block(block) => block.kind(),
            SlotView::ListItem { .. } => BlockKind::ListItem,
        }
    }

    /// Markdown text span of the slot
    pub fn to_markdown(&self) -> String {
        let serializer = Serializer::new();
        match self {
            SlotView::Block(block) => serializer.serialize_block(block),
            SlotView::ListItem { item, ordinal, .. } => serializer.serialize_list_item(item, *ordinal),
        }
    }
}

/// Transient line → slot mapping built from a document snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    slots: Vec<SlotRef>,
}

impl LineIndex {
    pub fn build(doc: &Document) -> Self {
        let mut slots = Vec::new();
        for (block_idx, block) in doc.blocks.iter().enumerate() {
            match block.list_items() {
                Some(items) if !items.is_empty() => {
                    for item_idx in 0..items.len() {
                        slots.push(SlotRef::ListItem {
                            block: block_idx,
                            item: item_idx,
                        });
                    }
                }
                _ => slots.push(SlotRef::Block { block: block_idx }),
            }
        }
        Self { slots }
    }

    /// Number of addressable lines
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot for a 1-based line number
    pub fn get(&self, line: usize) -> Option<SlotRef> {
        if line == 0 {
            return None;
        }
        self.slots.get(line - 1).copied()
    }

    /// Iterate `(line, slot)` pairs in line order
    pub fn iter(&self) -> impl Iterator<Item = (usize, SlotRef)> + '_ {
        self.slots.iter().enumerate().map(|(i, slot)| (i + 1, *slot))
    }

    /// Reach the node behind a line. The index must have been built from `doc`.
    pub fn resolve<'a>(&self, doc: &'a Document, line: usize) -> Option<SlotView<'a>> {
        match self.get(line)? {
            SlotRef::Block { block } => doc.blocks.get(block).map(SlotView::Block),
            SlotRef::ListItem { block, item } => {
                let list = doc.blocks.get(block)?;
                let ordinal = match list {
                    Block::OrderedList { start, .. } => Some(start + item as u64),
                    _ => None,
                };
                let item = list.list_items()?.get(item)?;
                Some(SlotView::ListItem { list, item, ordinal })
            }
        }
    }

    /// Current Markdown of one line
    pub fn slot_markdown(&self, doc: &Document, line: usize) -> DocumentResult<String> {
        self.resolve(doc, line)
            .map(|view| view.to_markdown())
            .ok_or_else(|| DocumentError::line_out_of_range(line, self.len()))
    }
}

/// Append plain text to the editable text of one line.
///
/// Paragraphs, headings and list items take the text at the end of their
/// inline content. A blockquote takes it in its last paragraph. Other blocks
/// are rejected with `NotTextual`.
pub fn append_text(doc: &mut Document, line: usize, text: &str) -> DocumentResult<()> {
    let index = LineIndex::build(doc);
    let slot = index
        .get(line)
        .ok_or_else(|| DocumentError::line_out_of_range(line, index.len()))?;

    let content = match slot {
        SlotRef::Block { block } => doc.blocks.get_mut(block).and_then(textual_content),
        SlotRef::ListItem { block, item } => match doc.blocks.get_mut(block) {
            Some(Block::OrderedList { items, .. }) | Some(Block::BulletList { items }) => {
                items.get_mut(item).map(|item| &mut item.paragraph)
            }
            _ => None,
        },
    };

    let Some(content) = content else {
        let kind = doc
            .blocks
            .get(slot.block())
            .map(Block::kind)
            .unwrap_or(BlockKind::Paragraph);
        return Err(DocumentError::not_textual(line, kind));
    };

    content.push(Inline::text(text));
    normalize_inlines(content);
    Ok(())
}

fn textual_content(block: &mut Block) -> Option<&mut Vec<Inline>> {
    match block {
        Block::Paragraph { content } | Block::Heading { content, .. } => Some(content),
        Block::Blockquote { content } => content.iter_mut().rev().find_map(textual_content),
        _ => None,
    }
}
