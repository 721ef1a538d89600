//! # Line-indexed rendering
//!
//! Renders a document with every addressable line labelled, using the same
//! numbering as [`LineIndex`](crate::line_index::LineIndex). This is the
//! context an assistant receives before it emits line-addressed changes.

use crate::ast::*;
use crate::line_index::{LineIndex, SlotRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output flavour for [`render_line_indexed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineFormat {
    /// HTML block elements carrying `data-line="N"`
    #[default]
    Html,
    /// `N: <markdown>` lines
    Markdown,
}

impl fmt::Display for LineFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineFormat::Html => f.write_str("html"),
            LineFormat::Markdown => f.write_str("markdown"),
        }
    }
}

impl FromStr for LineFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(LineFormat::Html),
            "markdown" | "md" => Ok(LineFormat::Markdown),
            other => Err(format!("Unknown line format: {}", other)),
        }
    }
}

pub fn render_line_indexed(doc: &Document, format: LineFormat) -> String {
    let index = LineIndex::build(doc);
    match format {
        LineFormat::Html => render_html(doc, &index),
        LineFormat::Markdown => render_markdown(doc, &index),
    }
}

fn render_markdown(doc: &Document, index: &LineIndex) -> String {
    let mut lines = Vec::with_capacity(index.len());
    for (line, _) in index.iter() {
        let Some(view) = index.resolve(doc, line) else {
            continue;
        };
        let prefix = format!("{}: ", line);
        let indent = " ".repeat(prefix.len());
        let markdown = view.to_markdown();

        let mut rendered = prefix;
        for (i, text) in markdown.split('\n').enumerate() {
            if i > 0 {
                rendered.push('\n');
                if !text.is_empty() {
                    rendered.push_str(&indent);
                }
            }
            rendered.push_str(text);
        }
        lines.push(rendered);
    }
    lines.join("\n")
}

struct Context {
    indent: String,
    depth: usize,
    buffer: String,
}

impl Context {
    fn new() -> Self {
        Self {
            indent: "  ".to_string(),
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add_line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buffer.push_str(&self.indent);
        }
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer.trim_end_matches('\n').to_string()
    }
}

fn render_html(doc: &Document, index: &LineIndex) -> String {
    let mut ctx = Context::new();
    let mut lines = index.iter().peekable();

    while let Some((line, slot)) = lines.next() {
        match slot {
            SlotRef::Block { block } => {
                if let Some(block) = doc.blocks.get(block) {
                    ctx.add_line(&block_html(block, Some(line)));
                }
            }
            SlotRef::ListItem { block, .. } => {
                let Some(list) = doc.blocks.get(block) else {
                    continue;
                };
                ctx.add_line(&list_open(list));
                ctx.indent();

                let mut current = Some((line, slot));
                while let Some((line, SlotRef::ListItem { item, .. })) = current {
                    if let Some(item) = list.list_items().and_then(|items| items.get(item)) {
                        ctx.add_line(&item_html(item, Some(line)));
                    }
                    current = lines
                        .next_if(|(_, next)| matches!(next, SlotRef::ListItem { block: b, .. } if *b == block));
                }

                ctx.dedent();
                ctx.add_line(list_close(list));
            }
        }
    }

    ctx.get_output()
}

fn line_attr(line: Option<usize>) -> String {
    match line {
        Some(line) => format!(" data-line=\"{}\"", line),
        None => String::new(),
    }
}

fn list_open(list: &Block) -> String {
    match list {
        Block::OrderedList { start, .. } if *start != 1 => format!("<ol start=\"{}\">", start),
        Block::OrderedList { .. } => "<ol>".to_string(),
        _ => "<ul>".to_string(),
    }
}

fn list_close(list: &Block) -> &'static str {
    match list {
        Block::OrderedList { .. } => "</ol>",
        _ => "</ul>",
    }
}

fn item_html(item: &ListItem, line: Option<usize>) -> String {
    let mut html = format!("<li{}>", line_attr(line));
    html.push_str(&inlines_html(&item.paragraph));
    for child in &item.children {
        html.push_str(&block_html(child, None));
    }
    html.push_str("</li>");
    html
}

fn block_html(block: &Block, line: Option<usize>) -> String {
    let attr = line_attr(line);
    match block {
        Block::Paragraph { content } => format!("<p{}>{}</p>", attr, inlines_html(content)),
        Block::Heading { level, content } => {
            let level = (*level).clamp(1, 6);
            format!("<h{level}{attr}>{}</h{level}>", inlines_html(content))
        }
        Block::Blockquote { content } => {
            let inner: String = content.iter().map(|b| block_html(b, None)).collect();
            format!("<blockquote{}>{}</blockquote>", attr, inner)
        }
        Block::CodeBlock { language, text } => {
            let class = language
                .as_ref()
                .map(|lang| format!(" class=\"language-{}\"", escape_html(lang)))
                .unwrap_or_default();
            format!("<pre{}><code{}>{}</code></pre>", attr, class, escape_html(text))
        }
        Block::OrderedList { items, .. } | Block::BulletList { items } => {
            let mut html = list_open(block);
            for item in items {
                html.push_str(&item_html(item, None));
            }
            html.push_str(list_close(block));
            html
        }
        Block::HorizontalRule => format!("<hr{}>", attr),
        Block::Image { src, alt, title } => {
            let title = title
                .as_ref()
                .map(|t| format!(" title=\"{}\"", escape_html(t)))
                .unwrap_or_default();
            format!(
                "<img{} src=\"{}\" alt=\"{}\"{}>",
                attr,
                escape_html(src),
                escape_html(alt),
                title
            )
        }
    }
}

fn inlines_html(content: &[Inline]) -> String {
    let mut html = String::new();
    for inline in content {
        match inline {
            Inline::HardBreak => html.push_str("<br>"),
            Inline::Text { text, marks } => {
                let mut closers = Vec::with_capacity(marks.len());
                for mark in marks {
                    let (open, close) = mark_tags(mark);
                    html.push_str(&open);
                    closers.push(close);
                }
                html.push_str(&escape_html(text));
                for close in closers.iter().rev() {
                    html.push_str(close);
                }
            }
        }
    }
    html
}

fn mark_tags(mark: &Mark) -> (String, &'static str) {
    match mark {
        Mark::Link { href, title } => {
            let title = title
                .as_ref()
                .map(|t| format!(" title=\"{}\"", escape_html(t)))
                .unwrap_or_default();
            (format!("<a href=\"{}\"{}>", escape_html(href), title), "</a>")
        }
        Mark::Bold => ("<strong>".to_string(), "</strong>"),
        Mark::Italic => ("<em>".to_string(), "</em>"),
        Mark::Strike => ("<s>".to_string(), "</s>"),
        Mark::Underline => ("<u>".to_string(), "</u>"),
        Mark::Code => ("<code>".to_string(), "</code>"),
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::from_markdown;

    #[test]
    fn test_render_html_numbers_list_items() {
        let doc = from_markdown("# Plan\n\n- **one**\n- two\n\nDone");
        let html = render_line_indexed(&doc, LineFormat::Html);

        assert_eq!(
            html,
            "<h1 data-line=\"1\">Plan</h1>\n\
             <ul>\n  \
             <li data-line=\"2\"><strong>one</strong></li>\n  \
             <li data-line=\"3\">two</li>\n\
             </ul>\n\
             <p data-line=\"4\">Done</p>"
        );
    }

    #[test]
    fn test_render_html_adjacent_lists_stay_apart() {
        let doc = Document::from_blocks(vec![
            Block::BulletList {
                items: vec![ListItem::text("a")],
            },
            Block::OrderedList {
                start: 5,
                items: vec![ListItem::text("b")],
            },
        ]);
        let html = render_line_indexed(&doc, LineFormat::Html);

        assert_eq!(
            html,
            "<ul>\n  <li data-line=\"1\">a</li>\n</ul>\n<ol start=\"5\">\n  <li data-line=\"2\">b</li>\n</ol>"
        );
    }

    #[test]
    fn test_render_markdown_indents_continuations() {
        let doc = from_markdown("Intro\n\n```rust\nfn main() {}\n```");
        let text = render_line_indexed(&doc, LineFormat::Markdown);

        assert_eq!(text, "1: Intro\n2: ```rust\n   fn main() {}\n   ```");
    }

    #[test]
    fn test_render_empty_document() {
        let doc = Document::new();
        assert_eq!(render_line_indexed(&doc, LineFormat::Html), "");
        assert_eq!(render_line_indexed(&doc, LineFormat::Markdown), "");
    }

    #[test]
    fn test_line_format_from_str() {
        assert_eq!("md".parse::<LineFormat>(), Ok(LineFormat::Markdown));
        assert!("pdf".parse::<LineFormat>().is_err());
    }
}
