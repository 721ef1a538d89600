use crate::ast::*;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};
use std::collections::BTreeSet;
use tracing::trace;

/// Parse Markdown into a [`Document`]. Never fails: constructs the model
/// cannot represent degrade to plain paragraphs.
pub fn from_markdown(source: &str) -> Document {
    Parser::new(source).parse_document()
}

/// Markdown parser for the structured document model
pub struct Parser<'src> {
    source: &'src str,
    options: Options,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            options: Options::ENABLE_STRIKETHROUGH,
        }
    }

    /// Parse a complete document
    pub fn parse_document(&self) -> Document {
        let mut builder = Builder::default();
        for event in CmarkParser::new_ext(self.source, self.options) {
            builder.event(event);
        }
        builder.finish()
    }
}

struct ImageData {
    src: String,
    alt: String,
    title: Option<String>,
}

enum Frame {
    Blockquote(Vec<Block>),
    List {
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    Item {
        paragraph: Option<Vec<Inline>>,
        inline: Vec<Inline>,
        children: Vec<Block>,
    },
    Paragraph {
        content: Vec<Inline>,
        image: Option<ImageData>,
        implicit: bool,
    },
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    CodeBlock {
        language: Option<String>,
        text: String,
    },
    Image(ImageData),
    /// Unsupported container (HTML block, table, footnote); its text
    /// becomes a plain paragraph.
    Opaque {
        text: String,
        depth: usize,
    },
}

#[derive(Default)]
struct Builder {
    root: Vec<Block>,
    stack: Vec<Frame>,
    marks: Vec<Mark>,
}

impl Builder {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule => {
                self.close_implicit();
                self.push_block(Block::HorizontalRule);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.html(&html),
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        if !is_inline_tag(&tag) {
            self.close_implicit();
        }

        if let Some(Frame::Opaque { depth, .. }) = self.stack.last_mut() {
            if !is_inline_tag(&tag) {
                *depth += 1;
            }
            return;
        }

        match tag {
            Tag::Paragraph => self.stack.push(Frame::Paragraph {
                content: Vec::new(),
                image: None,
                implicit: false,
            }),
            Tag::Heading { level, .. } => self.stack.push(Frame::Heading {
                level: heading_level(level),
                content: Vec::new(),
            }),
            Tag::BlockQuote(_) => self.stack.push(Frame::Blockquote(Vec::new())),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .filter(|lang| !lang.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.stack.push(Frame::CodeBlock {
                    language,
                    text: String::new(),
                });
            }
            Tag::List(start) => self.stack.push(Frame::List {
                start,
                items: Vec::new(),
            }),
            Tag::Item => self.stack.push(Frame::Item {
                paragraph: None,
                inline: Vec::new(),
                children: Vec::new(),
            }),
            Tag::Emphasis => self.marks.push(Mark::Italic),
            Tag::Strong => self.marks.push(Mark::Bold),
            Tag::Strikethrough => self.marks.push(Mark::Strike),
            Tag::Link {
                dest_url, title, ..
            } => self.marks.push(Mark::Link {
                href: dest_url.to_string(),
                title: (!title.is_empty()).then(|| title.to_string()),
            }),
            Tag::Image {
                dest_url, title, ..
            } => self.stack.push(Frame::Image(ImageData {
                src: dest_url.to_string(),
                alt: String::new(),
                title: (!title.is_empty()).then(|| title.to_string()),
            })),
            other => {
                trace!(tag = ?other, "Degrading unsupported block to paragraph");
                self.stack.push(Frame::Opaque {
                    text: String::new(),
                    depth: 0,
                });
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        let inline = is_inline_end(&tag);
        if !inline {
            self.close_implicit();
        }

        if let Some(Frame::Opaque { depth, text }) = self.stack.last_mut() {
            if inline {
                return;
            }
            if *depth > 0 {
                *depth -= 1;
                if !text.ends_with('\n') && !text.is_empty() {
                    text.push(' ');
                }
                return;
            }
        }

        match tag {
            TagEnd::Emphasis => remove_last(&mut self.marks, |m| *m == Mark::Italic),
            TagEnd::Strong => remove_last(&mut self.marks, |m| *m == Mark::Bold),
            TagEnd::Strikethrough => remove_last(&mut self.marks, |m| *m == Mark::Strike),
            TagEnd::Link => remove_last(&mut self.marks, |m| matches!(m, Mark::Link { .. })),
            TagEnd::Image => {
                if matches!(self.stack.last(), Some(Frame::Image(_))) {
                    if let Some(Frame::Image(data)) = self.stack.pop() {
                        self.place_image(data);
                    }
                }
            }
            _ => self.close_frame(),
        }
    }

    fn text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(Frame::CodeBlock { text: code, .. }) => code.push_str(text),
            Some(Frame::Image(data)) => data.alt.push_str(text),
            Some(Frame::Opaque { text: buf, .. }) => buf.push_str(text),
            _ => {
                let marks = self.current_marks();
                self.push_inline(Inline::Text {
                    text: text.to_string(),
                    marks,
                });
            }
        }
    }

    fn inline_code(&mut self, code: &str) {
        match self.stack.last_mut() {
            Some(Frame::Image(data)) => data.alt.push_str(code),
            Some(Frame::Opaque { text, .. }) => text.push_str(code),
            _ => {
                let mut marks = self.current_marks();
                marks.insert(Mark::Code);
                self.push_inline(Inline::Text {
                    text: code.to_string(),
                    marks,
                });
            }
        }
    }

    fn soft_break(&mut self) {
        match self.stack.last_mut() {
            Some(Frame::Heading { .. }) | Some(Frame::Image(_)) => self.text(" "),
            Some(Frame::Opaque { text, .. }) => text.push('\n'),
            _ => self.text("\n"),
        }
    }

    fn hard_break(&mut self) {
        match self.stack.last() {
            Some(Frame::Heading { .. }) | Some(Frame::Image(_)) => self.text(" "),
            Some(Frame::Opaque { .. }) => self.text("\n"),
            _ => self.push_inline(Inline::HardBreak),
        }
    }

    fn html(&mut self, html: &str) {
        if let Some(Frame::Opaque { text, .. }) = self.stack.last_mut() {
            text.push_str(html);
            return;
        }

        let tag = html.trim().to_ascii_lowercase();
        match tag.as_str() {
            "<br>" | "<br/>" | "<br />" => self.hard_break(),
            _ => match html_mark(&tag) {
                Some((mark, true)) => self.marks.push(mark),
                Some((mark, false)) => remove_last(&mut self.marks, |m| *m == mark),
                None => self.text(html),
            },
        }
    }

    fn current_marks(&self) -> BTreeSet<Mark> {
        self.marks.iter().cloned().collect()
    }

    /// Route an inline to the innermost frame that accepts inline content,
    /// wrapping orphan inlines in an implicit paragraph.
    fn push_inline(&mut self, inline: Inline) {
        match self.stack.last_mut() {
            Some(Frame::Paragraph { content, image, .. }) => {
                if let Some(data) = image.take() {
                    content.push(Inline::text(data.alt));
                }
                content.push(inline);
            }
            Some(Frame::Heading { content, .. }) => content.push(inline),
            Some(Frame::Item { inline: buf, .. }) => buf.push(inline),
            Some(Frame::Image(data)) => {
                if let Inline::Text { text, .. } = inline {
                    data.alt.push_str(&text);
                }
            }
            Some(Frame::CodeBlock { text, .. }) | Some(Frame::Opaque { text, .. }) => {
                if let Inline::Text { text: t, .. } = inline {
                    text.push_str(&t);
                }
            }
            Some(Frame::Blockquote(_)) | Some(Frame::List { .. }) | None => {
                self.stack.push(Frame::Paragraph {
                    content: vec![inline],
                    image: None,
                    implicit: true,
                });
            }
        }
    }

    fn place_image(&mut self, data: ImageData) {
        if let Some(Frame::Paragraph { content, image, .. }) = self.stack.last_mut() {
            if content.is_empty() && image.is_none() {
                *image = Some(data);
                return;
            }
        }
        let marks = self.current_marks();
        self.push_inline(Inline::Text {
            text: data.alt,
            marks,
        });
    }

    fn close_implicit(&mut self) {
        if matches!(
            self.stack.last(),
            Some(Frame::Paragraph { implicit: true, .. })
        ) {
            self.close_frame();
        }
    }

    fn close_frame(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        // Tag marks left open by unbalanced inline HTML end with the block.
        if matches!(
            frame,
            Frame::Paragraph { .. } | Frame::Heading { .. } | Frame::Item { .. }
        ) {
            self.marks.clear();
        }
        match finish_frame(frame) {
            Finished::Block(block) => self.push_block(block),
            Finished::Item(item) => match self.stack.last_mut() {
                Some(Frame::List { items, .. }) => items.push(item),
                // Items only live inside lists; a stray one gets its own list.
                _ => self.push_block(Block::BulletList { items: vec![item] }),
            },
            Finished::Nothing => {}
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.stack.last_mut() {
            None => self.root.push(block),
            Some(Frame::Blockquote(content)) => content.push(block),
            Some(Frame::Item {
                paragraph,
                inline,
                children,
            }) => {
                flush_item_inline(paragraph, inline, children);
                match block {
                    Block::Paragraph { content } if paragraph.is_none() && children.is_empty() => {
                        *paragraph = Some(content);
                    }
                    other => {
                        paragraph.get_or_insert_with(Vec::new);
                        children.push(other);
                    }
                }
            }
            Some(Frame::List { items, .. }) => {
                let item = match block {
                    Block::Paragraph { content } => ListItem::new(content),
                    other => ListItem::new(Vec::new()).with_children(vec![other]),
                };
                items.push(item);
            }
            Some(Frame::Paragraph { content, .. }) | Some(Frame::Heading { content, .. }) => {
                content.push(Inline::text(block.plain_text()));
            }
            Some(Frame::CodeBlock { text, .. }) | Some(Frame::Opaque { text, .. }) => {
                text.push_str(&block.plain_text());
            }
            Some(Frame::Image(data)) => data.alt.push_str(&block.plain_text()),
        }
    }

    fn finish(mut self) -> Document {
        while !self.stack.is_empty() {
            self.close_frame();
        }
        let mut doc = Document { blocks: self.root };
        doc.normalize();
        doc.blocks.retain(|block| !block.is_blank());
        doc
    }
}

enum Finished {
    Block(Block),
    Item(ListItem),
    Nothing,
}

impl From<Option<Block>> for Finished {
    fn from(block: Option<Block>) -> Self {
        block.map_or(Finished::Nothing, Finished::Block)
    }
}

fn finish_frame(frame: Frame) -> Finished {
    match frame {
        Frame::Paragraph {
            mut content, image, ..
        } => {
            normalize_inlines(&mut content);
            if let Some(data) = image {
                if content.is_empty() {
                    return Finished::Block(Block::Image {
                        src: data.src,
                        alt: data.alt,
                        title: data.title,
                    });
                }
                content.insert(0, Inline::text(data.alt));
                normalize_inlines(&mut content);
            }
            let block = Block::Paragraph { content };
            (!block.is_blank()).then_some(block).into()
        }
        Frame::Heading { level, mut content } => {
            normalize_inlines(&mut content);
            Finished::Block(Block::Heading { level, content })
        }
        Frame::Blockquote(content) => Finished::Block(Block::Blockquote { content }),
        Frame::CodeBlock { language, mut text } => {
            if text.ends_with('\n') {
                text.pop();
            }
            Finished::Block(Block::CodeBlock { language, text })
        }
        Frame::List { start, items } => Finished::Block(match start {
            Some(start) => Block::OrderedList { start, items },
            None => Block::BulletList { items },
        }),
        Frame::Item {
            mut paragraph,
            mut inline,
            mut children,
        } => {
            flush_item_inline(&mut paragraph, &mut inline, &mut children);
            let mut paragraph = paragraph.unwrap_or_default();
            normalize_inlines(&mut paragraph);
            Finished::Item(ListItem {
                paragraph,
                children,
            })
        }
        Frame::Image(data) => Finished::Block(Block::Image {
            src: data.src,
            alt: data.alt,
            title: data.title,
        }),
        Frame::Opaque { text, .. } => {
            let text = text.trim();
            (!text.is_empty()).then(|| Block::paragraph(text)).into()
        }
    }
}

fn flush_item_inline(
    paragraph: &mut Option<Vec<Inline>>,
    inline: &mut Vec<Inline>,
    children: &mut Vec<Block>,
) {
    if inline.is_empty() {
        return;
    }
    let content = std::mem::take(inline);
    if paragraph.is_none() && children.is_empty() {
        *paragraph = Some(content);
    } else {
        children.push(Block::Paragraph { content });
    }
}

/// Inline HTML tags that toggle a mark; `true` for an opening tag
fn html_mark(tag: &str) -> Option<(Mark, bool)> {
    let (name, opening) = match tag.strip_prefix("</") {
        Some(rest) => (rest.strip_suffix('>')?, false),
        None => (tag.strip_prefix('<')?.strip_suffix('>')?, true),
    };
    let mark = match name {
        "u" | "ins" => Mark::Underline,
        "strong" | "b" => Mark::Bold,
        "em" | "i" => Mark::Italic,
        "s" | "del" | "strike" => Mark::Strike,
        _ => return None,
    };
    Some((mark, opening))
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
    )
}

fn is_inline_end(tag: &TagEnd) -> bool {
    matches!(
        tag,
        TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link | TagEnd::Image
    )
}

fn remove_last<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) {
    if let Some(pos) = items.iter().rposition(pred) {
        items.remove(pos);
    }
}
