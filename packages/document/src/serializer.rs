use crate::ast::*;
use std::cmp::Reverse;

/// Serialize a document to Markdown with the default rule set
pub fn to_markdown(doc: &Document) -> String {
    Serializer::new().serialize(doc)
}

/// Serializer converts the document tree back to Markdown
///
/// The output is deterministic: ATX headings, `**bold**`, `*italic*`,
/// `~~strike~~`, `<u>underline</u>`, inline links with optional titles,
/// backtick-fenced code blocks, `-` / `1.` list markers, `>` quotes,
/// `---` rules and `![alt](src)` images. Blocks are separated by a blank
/// line and the output carries no trailing newline. Emphasis whose
/// delimiter runs would not flank their text is written as `<strong>`,
/// `<em>` or `<s>` instead, which the parser reads back as the same mark.
pub struct Serializer {
    bullets: [char; 2],
    ordered_delimiters: [char; 2],
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            bullets: ['-', '*'],
            ordered_delimiters: ['.', ')'],
        }
    }

    /// Serialize a Document to Markdown
    pub fn serialize(&self, doc: &Document) -> String {
        self.serialize_blocks(&doc.blocks)
    }

    /// Serialize a single block the way it appears at the top level
    pub fn serialize_block(&self, block: &Block) -> String {
        self.block(block, 0)
    }

    /// Serialize one list item as a single-item list with its original
    /// marker (`ordinal` is the item's number for ordered lists)
    pub fn serialize_list_item(&self, item: &ListItem, ordinal: Option<u64>) -> String {
        let marker = match ordinal {
            Some(n) => format!("{}{}", n, self.ordered_delimiters[0]),
            None => self.bullets[0].to_string(),
        };
        self.item(item, &marker)
    }

    pub fn serialize_blocks(&self, blocks: &[Block]) -> String {
        let mut output = String::new();
        let mut bullet_variant = 0;
        let mut ordered_variant = 0;
        let mut previous: Option<BlockKind> = None;

        for block in blocks {
            let kind = block.kind();
            // Adjacent lists of one kind would merge on re-parse unless
            // their markers differ.
            let variant = match kind {
                BlockKind::BulletList => {
                    bullet_variant = if previous == Some(kind) { 1 - bullet_variant } else { 0 };
                    bullet_variant
                }
                BlockKind::OrderedList => {
                    ordered_variant = if previous == Some(kind) { 1 - ordered_variant } else { 0 };
                    ordered_variant
                }
                _ => 0,
            };

            if previous.is_some() {
                output.push_str("\n\n");
            }
            output.push_str(&self.block(block, variant));
            previous = Some(kind);
        }

        output
    }

    fn block(&self, block: &Block, variant: usize) -> String {
        match block {
            Block::Paragraph { content } => escape_line_starts(&self.inlines(content, false)),
            Block::Heading { level, content } => {
                let level = (*level).clamp(1, 6) as usize;
                let text = self.inlines(content, true);
                if text.is_empty() {
                    "#".repeat(level)
                } else {
                    format!("{} {}", "#".repeat(level), text)
                }
            }
            Block::Blockquote { content } => {
                let inner = self.serialize_blocks(content);
                if inner.is_empty() {
                    return ">".to_string();
                }
                inner
                    .split('\n')
                    .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {}", line) })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Block::CodeBlock { language, text } => {
                let fence = "`".repeat(longest_run(text, '`').max(2) + 1);
                let language = language.as_deref().unwrap_or("");
                if text.is_empty() {
                    format!("{fence}{language}\n{fence}")
                } else {
                    format!("{fence}{language}\n{text}\n{fence}")
                }
            }
            Block::BulletList { items } => {
                let marker = self.bullets[variant % 2].to_string();
                items
                    .iter()
                    .map(|item| self.item(item, &marker))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Block::OrderedList { start, items } => {
                let delimiter = self.ordered_delimiters[variant % 2];
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let marker = format!("{}{}", start + i as u64, delimiter);
                        self.item(item, &marker)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Block::HorizontalRule => "---".to_string(),
            Block::Image { src, alt, title } => {
                format!("![{}]({})", escape_text(alt), destination(src, title.as_deref()))
            }
        }
    }

    fn item(&self, item: &ListItem, marker: &str) -> String {
        let mut body = escape_line_starts(&self.inlines(&item.paragraph, false));

        for (i, child) in item.children.iter().enumerate() {
            if body.is_empty() {
                body = self.block(child, 0);
                continue;
            }
            // A nested list directly under the item text stays tight.
            let joiner = if i == 0 && child.is_list() { "\n" } else { "\n\n" };
            body.push_str(joiner);
            body.push_str(&self.block(child, 0));
        }

        if body.is_empty() {
            return marker.to_string();
        }

        let indent = " ".repeat(marker.len() + 1);
        let mut output = String::new();
        for (i, line) in body.split('\n').enumerate() {
            if i == 0 {
                output.push_str(marker);
                output.push(' ');
            } else {
                output.push('\n');
                if !line.is_empty() {
                    output.push_str(&indent);
                }
            }
            output.push_str(line);
        }
        output
    }

    fn inlines(&self, content: &[Inline], heading: bool) -> String {
        let mut layout = InlineLayout::default();

        for (i, inline) in content.iter().enumerate() {
            match inline {
                Inline::HardBreak => layout.text(if heading { " " } else { "\\\n" }),
                Inline::Text { text, marks } => {
                    let text = if heading { text.replace('\n', " ") } else { text.clone() };
                    let code = marks.contains(&Mark::Code);
                    let target: Vec<&Mark> = marks.iter().filter(|m| **m != Mark::Code).collect();

                    layout.close_until(&target);

                    // Marks that run longest open first so they close last.
                    let mut to_open: Vec<Mark> = target
                        .into_iter()
                        .filter(|m| !layout.is_open(m))
                        .cloned()
                        .collect();
                    to_open.sort_by_key(|mark| Reverse(extent(&content[i..], mark)));

                    let mut rest = text.as_str();
                    if !code && to_open.iter().any(Mark::is_delimited) {
                        let trimmed = rest.trim_start_matches([' ', '\t']);
                        if !trimmed.is_empty() {
                            layout.text(&rest[..rest.len() - trimmed.len()]);
                            rest = trimmed;
                        }
                    }

                    for mark in to_open {
                        layout.open(mark);
                    }

                    if code {
                        layout.text(&code_span(rest));
                    } else {
                        layout.text(&escape_text(rest));
                    }
                }
            }
        }

        layout.close_until(&[]);
        layout.render()
    }
}

/// Number of consecutive runs from the start of `content` carrying `mark`
fn extent(content: &[Inline], mark: &Mark) -> usize {
    content
        .iter()
        .filter_map(Inline::marks)
        .take_while(|marks| marks.contains(mark))
        .count()
}

enum Piece {
    Text(String),
    Open(usize),
    Close(usize),
}

/// One contiguous stretch of a mark. Delimited marks fall back to HTML tags
/// when their delimiter runs would not flank correctly.
struct Span {
    mark: Mark,
    html: bool,
}

/// Inline output laid out as text and mark boundaries; delimiter forms are
/// chosen once the neighbours of every boundary are known.
#[derive(Default)]
struct InlineLayout {
    pieces: Vec<Piece>,
    spans: Vec<Span>,
    open: Vec<usize>,
}

impl InlineLayout {
    fn text(&mut self, text: &str) {
        if !text.is_empty() {
            self.pieces.push(Piece::Text(text.to_string()));
        }
    }

    fn is_open(&self, mark: &Mark) -> bool {
        self.open.iter().any(|id| self.spans[*id].mark == *mark)
    }

    fn open(&mut self, mark: Mark) {
        // `![` would start an image.
        if matches!(mark, Mark::Link { .. }) {
            if let Some(Piece::Text(text)) = self.pieces.last_mut() {
                if text.ends_with('!') {
                    text.insert(text.len() - 1, '\\');
                }
            }
        }
        let id = self.spans.len();
        self.spans.push(Span { mark, html: false });
        self.open.push(id);
        self.pieces.push(Piece::Open(id));
    }

    /// Close every span above the longest open prefix contained in `target`.
    /// Trailing spaces move outside closing delimiter runs.
    fn close_until(&mut self, target: &[&Mark]) {
        let keep = self
            .open
            .iter()
            .take_while(|id| target.contains(&&self.spans[**id].mark))
            .count();
        if self.open.len() <= keep {
            return;
        }

        let mut trailing = None;
        if self.open[keep..].iter().any(|id| self.spans[*id].mark.is_delimited()) {
            if let Some(Piece::Text(text)) = self.pieces.last_mut() {
                let trimmed_len = text.trim_end_matches([' ', '\t']).len();
                if trimmed_len > 0 && trimmed_len < text.len() {
                    trailing = Some(text.split_off(trimmed_len));
                }
            }
        }

        while self.open.len() > keep {
            if let Some(id) = self.open.pop() {
                self.pieces.push(Piece::Close(id));
            }
        }
        if let Some(trailing) = trailing {
            self.pieces.push(Piece::Text(trailing));
        }
    }

    fn render(mut self) -> String {
        loop {
            let unsafe_spans = self.misplaced_delimiters();
            if unsafe_spans.is_empty() {
                break;
            }
            for id in unsafe_spans {
                self.spans[id].html = true;
            }
        }
        self.pieces.iter().map(|piece| self.piece(piece)).collect()
    }

    fn piece(&self, piece: &Piece) -> String {
        match piece {
            Piece::Text(text) => text.clone(),
            Piece::Open(id) => opener(&self.spans[*id]).to_string(),
            Piece::Close(id) => closer(&self.spans[*id]),
        }
    }

    /// Spans whose delimiter runs would not parse back as that mark
    fn misplaced_delimiters(&self) -> Vec<usize> {
        let rendered: Vec<String> = self.pieces.iter().map(|piece| self.piece(piece)).collect();
        let mut misplaced = Vec::new();

        for (i, piece) in self.pieces.iter().enumerate() {
            let (id, opening) = match piece {
                Piece::Open(id) => (*id, true),
                Piece::Close(id) => (*id, false),
                Piece::Text(_) => continue,
            };
            let Some(delimiter) = self.delimiter(id) else {
                continue;
            };

            let before = rendered[..i].iter().rev().find_map(|s| s.chars().last());
            let after = rendered[i + 1..].iter().find_map(|s| s.chars().next());
            let flanking = if opening {
                left_flanking(before, after)
            } else {
                right_flanking(before, after)
            };

            // A closer and an opener of one delimiter merge into a single run.
            let previous = (0..i).rev().find(|j| !rendered[*j].is_empty());
            let touching = previous.is_some_and(|j| match self.pieces[j] {
                Piece::Open(other) => !opening && self.delimiter(other) == Some(delimiter),
                Piece::Close(other) => opening && self.delimiter(other) == Some(delimiter),
                Piece::Text(_) => false,
            });

            if (!flanking || touching) && !misplaced.contains(&id) {
                misplaced.push(id);
            }
        }

        misplaced
    }

    fn delimiter(&self, id: usize) -> Option<char> {
        let span = &self.spans[id];
        if span.html {
            return None;
        }
        match span.mark {
            Mark::Bold | Mark::Italic => Some('*'),
            Mark::Strike => Some('~'),
            _ => None,
        }
    }
}

#[derive(PartialEq)]
enum CharClass {
    Space,
    Punctuation,
    Word,
    /// Non-ASCII symbol that may or may not count as punctuation
    Other,
}

fn class(ch: Option<char>) -> CharClass {
    match ch {
        None => CharClass::Space,
        Some(c) if c.is_whitespace() => CharClass::Space,
        Some(c) if c.is_ascii_punctuation() => CharClass::Punctuation,
        Some(c) if c.is_alphanumeric() => CharClass::Word,
        Some(_) => CharClass::Other,
    }
}

fn left_flanking(before: Option<char>, after: Option<char>) -> bool {
    let after = class(after);
    after == CharClass::Word
        || (after != CharClass::Space
            && matches!(class(before), CharClass::Space | CharClass::Punctuation))
}

fn right_flanking(before: Option<char>, after: Option<char>) -> bool {
    let before = class(before);
    before == CharClass::Word
        || (before != CharClass::Space
            && matches!(class(after), CharClass::Space | CharClass::Punctuation))
}

fn opener(span: &Span) -> &'static str {
    match (&span.mark, span.html) {
        (Mark::Link { .. }, _) => "[",
        (Mark::Bold, false) => "**",
        (Mark::Bold, true) => "<strong>",
        (Mark::Italic, false) => "*",
        (Mark::Italic, true) => "<em>",
        (Mark::Strike, false) => "~~",
        (Mark::Strike, true) => "<s>",
        (Mark::Underline, _) => "<u>",
        (Mark::Code, _) => "`",
    }
}

fn closer(span: &Span) -> String {
    match (&span.mark, span.html) {
        (Mark::Link { href, title }, _) => format!("]({})", destination(href, title.as_deref())),
        (Mark::Bold, false) => "**".to_string(),
        (Mark::Bold, true) => "</strong>".to_string(),
        (Mark::Italic, false) => "*".to_string(),
        (Mark::Italic, true) => "</em>".to_string(),
        (Mark::Strike, false) => "~~".to_string(),
        (Mark::Strike, true) => "</s>".to_string(),
        (Mark::Underline, _) => "</u>".to_string(),
        (Mark::Code, _) => "`".to_string(),
    }
}

fn destination(href: &str, title: Option<&str>) -> String {
    let mut out = if href.is_empty() || href.contains([' ', '(', ')', '<', '>']) {
        format!("<{}>", href.replace('<', "%3C").replace('>', "%3E"))
    } else {
        href.to_string()
    };
    if let Some(title) = title {
        out.push_str(" \"");
        out.push_str(&title.replace('\\', "\\\\").replace('"', "\\\""));
        out.push('"');
    }
    out
}

fn code_span(text: &str) -> String {
    let ticks = "`".repeat(longest_run(text, '`') + 1);
    let pad = text.starts_with('`')
        || text.ends_with('`')
        || (text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty());
    if pad {
        format!("{ticks} {text} {ticks}")
    } else {
        format!("{ticks}{text}{ticks}")
    }
}

fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Backslash-escape characters that would otherwise start inline markup
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(
            ch,
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' | '>' | '#' | '~' | '&'
        ) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Escape the characters that would turn a paragraph line into a list
/// item, a setext underline or a thematic break.
fn escape_line_starts(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let body = line.trim_start();
            let indent = &line[..line.len() - body.len()];
            if body.starts_with(['-', '+', '=']) {
                return format!("{indent}\\{body}");
            }
            let digits = body.chars().take_while(char::is_ascii_digit).count();
            if digits > 0 && body[digits..].starts_with(['.', ')']) {
                return format!("{indent}{}\\{}", &body[..digits], &body[digits..]);
            }
            line.to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_marks() {
        let doc = Document::from_blocks(vec![Block::Paragraph {
            content: vec![
                Inline::marked("bold", [Mark::Bold]),
                Inline::text(" "),
                Inline::marked("code", [Mark::Code]),
                Inline::text(" "),
                Inline::marked("gone", [Mark::Strike]),
                Inline::text(" "),
                Inline::marked("under", [Mark::Underline]),
            ],
        }]);

        assert_eq!(to_markdown(&doc), "**bold** `code` ~~gone~~ <u>under</u>");
    }

    #[test]
    fn test_serialize_link_with_title() {
        let doc = Document::from_blocks(vec![Block::Paragraph {
            content: vec![Inline::marked(
                "docs",
                [Mark::Link {
                    href: "https://example.com".to_string(),
                    title: Some("Docs".to_string()),
                }],
            )],
        }]);

        assert_eq!(to_markdown(&doc), "[docs](https://example.com \"Docs\")");
    }

    #[test]
    fn test_serialize_nested_list() {
        let doc = Document::from_blocks(vec![Block::OrderedList {
            start: 1,
            items: vec![
                ListItem::text("first").with_children(vec![Block::BulletList {
                    items: vec![ListItem::text("inner")],
                }]),
                ListItem::text("second"),
            ],
        }]);

        assert_eq!(to_markdown(&doc), "1. first\n   - inner\n2. second");
    }

    #[test]
    fn test_adjacent_lists_alternate_markers() {
        let doc = Document::from_blocks(vec![
            Block::BulletList {
                items: vec![ListItem::text("a")],
            },
            Block::BulletList {
                items: vec![ListItem::text("b")],
            },
        ]);

        assert_eq!(to_markdown(&doc), "- a\n\n* b");
    }

    #[test]
    fn test_code_fence_widens() {
        let doc = Document::from_blocks(vec![Block::CodeBlock {
            language: Some("md".to_string()),
            text: "```\ninner\n```".to_string(),
        }]);

        assert_eq!(to_markdown(&doc), "````md\n```\ninner\n```\n````");
    }

    #[test]
    fn test_escapes_markup_in_text() {
        let doc = Document::from_blocks(vec![Block::paragraph("- not a list *nor emphasis*")]);
        assert_eq!(to_markdown(&doc), "\\- not a list \\*nor emphasis\\*");
    }

    #[test]
    fn test_blockquote_prefixes_every_line() {
        let doc = Document::from_blocks(vec![Block::Blockquote {
            content: vec![Block::paragraph("one"), Block::paragraph("two")],
        }]);

        assert_eq!(to_markdown(&doc), "> one\n>\n> two");
    }
}
