use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Root document node
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut doc = Self { blocks };
        doc.normalize();
        doc
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Merge adjacent runs that carry the same marks and drop empty runs,
    /// recursively. Paragraphs and headings left without content are kept;
    /// callers that want them gone filter on `Block::is_blank`.
    pub fn normalize(&mut self) {
        for block in &mut self.blocks {
            block.normalize();
        }
    }
}

/// Block-level node kinds, used for logging and addressing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading,
    Blockquote,
    CodeBlock,
    OrderedList,
    BulletList,
    ListItem,
    HorizontalRule,
    Image,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading => "heading",
            BlockKind::Blockquote => "blockquote",
            BlockKind::CodeBlock => "code_block",
            BlockKind::OrderedList => "ordered_list",
            BlockKind::BulletList => "bullet_list",
            BlockKind::ListItem => "list_item",
            BlockKind::HorizontalRule => "horizontal_rule",
            BlockKind::Image => "image",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Block node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph {
        content: Vec<Inline>,
    },

    Heading {
        level: u8,
        content: Vec<Inline>,
    },

    Blockquote {
        content: Vec<Block>,
    },

    CodeBlock {
        language: Option<String>,
        text: String,
    },

    OrderedList {
        start: u64,
        items: Vec<ListItem>,
    },

    BulletList {
        items: Vec<ListItem>,
    },

    HorizontalRule,

    Image {
        src: String,
        alt: String,
        title: Option<String>,
    },
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph {
            content: vec![Inline::text(text)],
        }
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Block::Heading {
            level: level.clamp(1, 6),
            content: vec![Inline::text(text)],
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Paragraph { .. } => BlockKind::Paragraph,
            Block::Heading { .. } => BlockKind::Heading,
            Block::Blockquote { .. } => BlockKind::Blockquote,
            Block::CodeBlock { .. } => BlockKind::CodeBlock,
            Block::OrderedList { .. } => BlockKind::OrderedList,
            Block::BulletList { .. } => BlockKind::BulletList,
            Block::HorizontalRule => BlockKind::HorizontalRule,
            Block::Image { .. } => BlockKind::Image,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Block::OrderedList { .. } | Block::BulletList { .. })
    }

    pub fn list_items(&self) -> Option<&[ListItem]> {
        match self {
            Block::OrderedList { items, .. } | Block::BulletList { items } => Some(items),
            _ => None,
        }
    }

    /// True for text blocks with no visible content
    pub fn is_blank(&self) -> bool {
        match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => {
                content.iter().all(|inline| match inline {
                    Inline::Text { text, .. } => text.trim().is_empty(),
                    Inline::HardBreak => true,
                })
            }
            _ => false,
        }
    }

    /// Concatenated text of the block, without any markup
    pub fn plain_text(&self) -> String {
        match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => inline_text(content),
            Block::Blockquote { content } => content
                .iter()
                .map(Block::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
            Block::CodeBlock { text, .. } => text.clone(),
            Block::OrderedList { items, .. } | Block::BulletList { items } => items
                .iter()
                .map(ListItem::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
            Block::HorizontalRule => String::new(),
            Block::Image { alt, .. } => alt.clone(),
        }
    }

    fn normalize(&mut self) {
        match self {
            Block::Paragraph { content } | Block::Heading { content, .. } => {
                normalize_inlines(content);
            }
            Block::Blockquote { content } => {
                for block in content {
                    block.normalize();
                }
            }
            Block::OrderedList { items, .. } | Block::BulletList { items } => {
                for item in items {
                    item.normalize();
                }
            }
            Block::CodeBlock { .. } | Block::HorizontalRule | Block::Image { .. } => {}
        }
    }
}

/// List item: one leading paragraph followed by nested blocks
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListItem {
    pub paragraph: Vec<Inline>,
    pub children: Vec<Block>,
}

impl ListItem {
    pub fn new(paragraph: Vec<Inline>) -> Self {
        Self {
            paragraph,
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![Inline::text(text)])
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }

    pub fn plain_text(&self) -> String {
        let mut out = inline_text(&self.paragraph);
        for child in &self.children {
            out.push('\n');
            out.push_str(&child.plain_text());
        }
        out
    }

    fn normalize(&mut self) {
        normalize_inlines(&mut self.paragraph);
        for child in &mut self.children {
            child.normalize();
        }
    }
}

/// Inline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String, marks: BTreeSet<Mark> },
    HardBreak,
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text {
            text: text.into(),
            marks: BTreeSet::new(),
        }
    }

    pub fn marked(text: impl Into<String>, marks: impl IntoIterator<Item = Mark>) -> Self {
        Inline::Text {
            text: text.into(),
            marks: marks.into_iter().collect(),
        }
    }

    pub fn marks(&self) -> Option<&BTreeSet<Mark>> {
        match self {
            Inline::Text { marks, .. } => Some(marks),
            Inline::HardBreak => None,
        }
    }
}

/// Inline formatting annotation. The derived ordering is the canonical
/// nesting order used by the serializer (outermost first).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Link { href: String, title: Option<String> },
    Bold,
    Italic,
    Strike,
    Underline,
    Code,
}

impl Mark {
    pub fn link(href: impl Into<String>) -> Self {
        Mark::Link {
            href: href.into(),
            title: None,
        }
    }

    /// Marks written with flanking delimiter runs (`**`, `*`, `~~`)
    pub fn is_delimited(&self) -> bool {
        matches!(self, Mark::Bold | Mark::Italic | Mark::Strike)
    }
}

pub fn inline_text(content: &[Inline]) -> String {
    let mut out = String::new();
    for inline in content {
        match inline {
            Inline::Text { text, .. } => out.push_str(text),
            Inline::HardBreak => out.push('\n'),
        }
    }
    out
}

pub fn normalize_inlines(content: &mut Vec<Inline>) {
    let mut merged: Vec<Inline> = Vec::with_capacity(content.len());
    for inline in content.drain(..) {
        match inline {
            Inline::Text { text, marks } => {
                if text.is_empty() {
                    continue;
                }
                if let Some(Inline::Text {
                    text: prev_text,
                    marks: prev_marks,
                }) = merged.last_mut()
                {
                    if *prev_marks == marks {
                        prev_text.push_str(&text);
                        continue;
                    }
                }
                merged.push(Inline::Text { text, marks });
            }
            Inline::HardBreak => merged.push(Inline::HardBreak),
        }
    }
    *content = merged;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_merges_runs() {
        let mut content = vec![
            Inline::text("Hello "),
            Inline::text("world"),
            Inline::marked("", [Mark::Bold]),
            Inline::marked("!", [Mark::Bold]),
        ];
        normalize_inlines(&mut content);

        assert_eq!(
            content,
            vec![Inline::text("Hello world"), Inline::marked("!", [Mark::Bold])]
        );
    }

    #[test]
    fn test_mark_order_is_independent_of_insertion() {
        let a = Inline::marked("x", [Mark::Italic, Mark::Bold]);
        let b = Inline::marked("x", [Mark::Bold, Mark::Italic]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_plain_text_of_list() {
        let list = Block::BulletList {
            items: vec![ListItem::text("one"), ListItem::text("two")],
        };
        assert_eq!(list.plain_text(), "one\ntwo");
        assert_eq!(list.kind(), BlockKind::BulletList);
    }
}
