use criterion::{black_box, criterion_group, criterion_main, Criterion};
use redline_reconcile::{extract_objects, Reconciler};

fn base_document() -> String {
    (1..=200)
        .map(|i| format!("Paragraph number {} with some *emphasis*.", i))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn sparse_stream() -> String {
    let changes: Vec<String> = (1..=50)
        .map(|i| {
            format!(
                r#"{{"line": {}, "type": "replace", "content": "Rewritten paragraph {}"}}"#,
                i * 4,
                i
            )
        })
        .collect();
    format!("{{\"elements\": [{}]}}", changes.join(", "))
}

fn extract_partial(c: &mut Criterion) {
    let stream = sparse_stream();
    let partial = &stream[..stream.len() - 20];

    c.bench_function("extract_objects_partial", |b| {
        b.iter(|| extract_objects(black_box(partial)))
    });
}

fn reconcile_sparse(c: &mut Criterion) {
    let base = base_document();
    let stream = sparse_stream();
    let reconciler = Reconciler::new();

    c.bench_function("reconcile_sparse_patch", |b| {
        b.iter(|| reconciler.reconcile(black_box(base.as_str()), black_box(&stream)))
    });
}

criterion_group!(benches, extract_partial, reconcile_sparse);
criterion_main!(benches);
