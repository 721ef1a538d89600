use anyhow::Result;
use redline_document::{from_markdown, render_line_indexed, LineFormat};
use redline_reconcile::{reconcile, Change, PatchKind, Reconciler, StreamScanner};

const BASE: &str = "# Groceries

Weekly list.

- milk
- eggs
- bread

Thanks!";

/// Feed the stream in small chunks, re-running the pipeline after each one
/// against the same base, and collect every distinct result.
fn stream_in_chunks(base: &str, raw: &str, chunk: usize) -> Vec<String> {
    let reconciler = Reconciler::new();
    let chars: Vec<char> = raw.chars().collect();
    let mut buffer = String::new();
    let mut results: Vec<String> = Vec::new();

    for piece in chars.chunks(chunk) {
        buffer.extend(piece);
        if let Some(markdown) = reconciler.reconcile(base, &buffer) {
            if results.last() != Some(&markdown) {
                results.push(markdown);
            }
        }
    }
    results
}

#[test]
fn test_line_numbers_follow_rendered_context() {
    let doc = from_markdown(BASE);
    let context = render_line_indexed(&doc, LineFormat::Markdown);

    assert_eq!(
        context,
        "1: # Groceries\n2: Weekly list.\n3: - milk\n4: - eggs\n5: - bread\n6: Thanks!"
    );
}

#[test]
fn test_streamed_sparse_patch_converges() {
    let raw = r#"```json
{"elements": [
  {"line": 4, "type": "replace", "content": "- a dozen eggs"},
  {"line": 5, "type": "insert", "content": "- butter"},
  {"line": 2, "type": "delete", "content": ""}
]}
```"#;

    let results = stream_in_chunks(BASE, raw, 7);
    let last = results.last().cloned();

    assert_eq!(
        last.as_deref(),
        Some("# Groceries\n\n- milk\n- a dozen eggs\n- bread\n- butter\n\nThanks!")
    );
    // The first visible result only carries the first change.
    assert_eq!(
        results.first().map(String::as_str),
        Some("# Groceries\n\nWeekly list.\n\n- milk\n- a dozen eggs\n- bread\n\nThanks!")
    );
}

#[test]
fn test_streamed_rewrite_grows_document() {
    let raw = r##"[{"line":1,"type":"insert","content":"# Plan"},{"line":2,"type":"insert","content":"1. Wake"},{"line":3,"type":"insert","content":"2. Code"}]"##;

    let results = stream_in_chunks(BASE, raw, 5);
    assert_eq!(
        results,
        vec![
            "# Plan".to_string(),
            "# Plan\n\n1. Wake".to_string(),
            "# Plan\n\n1. Wake\n2. Code".to_string(),
        ]
    );
}

#[test]
fn test_scanner_matches_full_extraction() -> Result<()> {
    let raw = r#"[{"line":1,"type":"delete"},{"line":3,"type":"replace","content":"- oat milk"}]"#;

    let mut scanner = StreamScanner::new();
    let mut values = Vec::new();
    for chunk in raw.as_bytes().chunks(4) {
        values.extend(scanner.push(std::str::from_utf8(chunk)?));
    }

    let from_scanner = redline_reconcile::validate(&values);
    let from_reconciler = Reconciler::new().parse(raw);
    assert_eq!(from_scanner, from_reconciler);
    assert_eq!(from_scanner, vec![Change::delete(1), Change::replace(3, "- oat milk")]);
    Ok(())
}

#[test]
fn test_reconcile_is_deterministic() {
    let raw = r#"[{"line":6,"type":"replace","content":"Thanks, **all**!"}]"#;

    let first = reconcile(BASE, raw);
    let second = reconcile(BASE, raw);
    assert_eq!(first, second);
    assert_eq!(
        first.as_deref(),
        Some("# Groceries\n\nWeekly list.\n\n- milk\n- eggs\n- bread\n\nThanks, **all**!")
    );
}

#[test]
fn test_detailed_result_serializes() -> Result<()> {
    let raw = r#"[{"line":2,"type":"delete"},{"line":40,"type":"replace","content":"x"}]"#;
    let result = Reconciler::new().reconcile_detailed(BASE, raw);

    assert_eq!(result.kind, PatchKind::SparsePatch);
    let json = serde_json::to_value(&result)?;
    assert_eq!(json["kind"], "sparse-patch");
    assert_eq!(json["report"]["outcomes"][1], "out-of-range");
    Ok(())
}
