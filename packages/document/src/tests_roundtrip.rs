/// Round-trip tests for the Markdown bridge
use crate::*;

fn assert_roundtrip(source: &str) {
    let doc = from_markdown(source);
    let serialized = to_markdown(&doc);
    let reparsed = from_markdown(&serialized);

    assert_eq!(
        doc, reparsed,
        "Round-trip changed the document.\nsource:\n{}\nserialized:\n{}",
        source, serialized
    );
}

#[test]
fn test_roundtrip_headings() {
    for level in 1..=6 {
        let source = format!("{} Heading {}", "#".repeat(level), level);
        assert_roundtrip(&source);
        assert_eq!(to_markdown(&from_markdown(&source)), source);
    }
}

#[test]
fn test_roundtrip_marks() {
    let sources = vec![
        "plain **bold** text",
        "plain *italic* text",
        "plain ~~struck~~ text",
        "plain <u>underlined</u> text",
        "plain `code` text",
        "plain [link](https://example.com) text",
        "plain [titled](https://example.com \"A title\") text",
        "[**bold link**](https://example.com)",
        "**`code in bold`**",
        "**<u>bold underline</u>**",
        "``code with ` tick``",
    ];

    for source in sources {
        assert_roundtrip(source);
    }
}

#[test]
fn test_roundtrip_lists() {
    let sources = vec![
        "- one\n- two\n- three",
        "1. one\n2. two",
        "3. three\n4. four",
        "- parent\n  - child\n    - grandchild\n- sibling",
        "1. first\n\n   continued paragraph\n\n2. second",
        "- item\n\n  ```rust\n  let x = 1;\n  ```",
        "- quoted\n\n  > inside",
    ];

    for source in sources {
        assert_roundtrip(source);
    }
}

#[test]
fn test_roundtrip_blocks() {
    let sources = vec![
        "> quoted\n>\n> - with list",
        "```rust\nfn main() {\n    println!(\"hi\");\n}\n```",
        "````md\n```\nnested fence\n```\n````",
        "```\n```",
        "before\n\n---\n\nafter",
        "![A cat](cat.png \"Cat\")",
        "![](images/empty-alt.png)",
        "line one\nline two",
        "hard\\\nbreak",
    ];

    for source in sources {
        assert_roundtrip(source);
    }
}

#[test]
fn test_roundtrip_escaping() {
    let doc = Document::from_blocks(vec![
        Block::paragraph("a * b _ c # d [e] <f> ~g~ & h \\ i `j`"),
        Block::paragraph("- not a list"),
        Block::paragraph("1. not ordered"),
        Block::paragraph("+ plus\n= equals"),
        Block::heading(2, "C# rocks #"),
    ]);

    let serialized = to_markdown(&doc);
    assert_eq!(from_markdown(&serialized), doc);
}

#[test]
fn test_roundtrip_adjacent_lists() {
    let doc = Document::from_blocks(vec![
        Block::BulletList {
            items: vec![ListItem::text("a")],
        },
        Block::BulletList {
            items: vec![ListItem::text("b")],
        },
        Block::OrderedList {
            start: 1,
            items: vec![ListItem::text("c")],
        },
        Block::OrderedList {
            start: 1,
            items: vec![ListItem::text("d")],
        },
    ]);

    let serialized = to_markdown(&doc);
    assert_eq!(serialized, "- a\n\n* b\n\n1. c\n\n1) d");
    assert_eq!(from_markdown(&serialized), doc);
}

#[test]
fn test_roundtrip_constructed_document() {
    let doc = Document::from_blocks(vec![
        Block::heading(1, "Release notes"),
        Block::Paragraph {
            content: vec![
                Inline::text("Ships "),
                Inline::marked("today", [Mark::Bold]),
                Inline::text(" with "),
                Inline::marked("fixes", [Mark::Italic, Mark::Underline]),
                Inline::text("."),
            ],
        },
        Block::OrderedList {
            start: 1,
            items: vec![
                ListItem::text("Parser"),
                ListItem::text("Serializer").with_children(vec![Block::BulletList {
                    items: vec![ListItem::text("escaping")],
                }]),
            ],
        },
        Block::Blockquote {
            content: vec![Block::paragraph("Quoted")],
        },
        Block::CodeBlock {
            language: Some("sh".to_string()),
            text: "cargo build".to_string(),
        },
        Block::HorizontalRule,
    ]);

    let serialized = to_markdown(&doc);
    assert!(!serialized.ends_with('\n'));
    assert_eq!(from_markdown(&serialized), doc);
}

#[test]
fn test_unsupported_constructs_degrade() {
    let doc = from_markdown("| a | b |\n|---|---|\n| 1 | 2 |");
    assert!(doc
        .blocks
        .iter()
        .all(|block| block.kind() == BlockKind::Paragraph));

    let doc = from_markdown("<section>\nraw html\n</section>");
    assert_eq!(doc.blocks.len(), 1);
    assert!(doc.blocks[0].plain_text().contains("raw html"));
}

fn paragraph(content: Vec<Inline>) -> Document {
    Document::from_blocks(vec![Block::Paragraph { content }])
}

fn assert_document_roundtrip(doc: &Document) {
    let serialized = to_markdown(doc);
    assert_eq!(
        &from_markdown(&serialized),
        doc,
        "Round-trip changed the document.\nserialized:\n{}",
        serialized
    );
}

#[test]
fn test_bang_before_link_stays_text() {
    let doc = paragraph(vec![
        Inline::text("Wow!"),
        Inline::marked("site", [Mark::link("https://x.io")]),
    ]);

    assert_eq!(to_markdown(&doc), "Wow\\![site](https://x.io)");
    assert_document_roundtrip(&doc);
}

#[test]
fn test_touching_delimiter_runs_stay_apart() {
    let doc = paragraph(vec![
        Inline::marked("a", [Mark::Bold]),
        Inline::marked("b", [Mark::Bold, Mark::Italic]),
        Inline::marked("c", [Mark::Italic]),
    ]);

    assert_eq!(to_markdown(&doc), "**a*b***<em>c</em>");
    assert_document_roundtrip(&doc);
}

#[test]
fn test_punctuation_before_closer_falls_back_to_tags() {
    let doc = paragraph(vec![
        Inline::marked("foo.", [Mark::Bold]),
        Inline::text("bar"),
    ]);

    assert_eq!(to_markdown(&doc), "<strong>foo.</strong>bar");
    assert_document_roundtrip(&doc);
}

#[test]
fn test_roundtrip_mark_pairs() {
    let marks = vec![
        Mark::Bold,
        Mark::Italic,
        Mark::Strike,
        Mark::Underline,
        Mark::Code,
        Mark::link("https://x.io"),
    ];

    for a in &marks {
        let single = |text: &str| Inline::marked(text, [a.clone()]);

        // Punctuation inside the mark, word characters outside.
        assert_document_roundtrip(&paragraph(vec![
            Inline::text("w"),
            single(".x."),
            Inline::text("y"),
        ]));
        // Bang and punctuation around the mark.
        assert_document_roundtrip(&paragraph(vec![
            Inline::text("Wow!"),
            single("site"),
            Inline::text("!"),
        ]));

        for b in &marks {
            if a == b {
                continue;
            }
            let first = || Inline::marked("x", [a.clone()]);
            let second = |text: &str| Inline::marked(text, [b.clone()]);
            let both = |text: &str| Inline::marked(text, [a.clone(), b.clone()]);

            let cases = vec![
                vec![first(), second("y")],
                vec![first(), both("y"), second("z")],
                vec![Inline::marked("x.", [a.clone()]), second(".y")],
                vec![Inline::text("Wow!"), both("site")],
                vec![Inline::text("a "), both("b."), Inline::text("c")],
            ];
            for content in cases {
                assert_document_roundtrip(&paragraph(content));
            }
        }
    }
}
