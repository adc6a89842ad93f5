use criterion::{Criterion, criterion_group, criterion_main};
use mttast_engine::{Cmd, DirtyBlocks, Editor, EditorCore, Point, create_update};
mod common;

fn bench_create_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("changes");
    group.sample_size(10);

    let doc = common::generate_document(200, 5);

    let mut all_dirty = DirtyBlocks::new();
    for (path, block) in doc.blocks() {
        all_dirty.mark_upsert(block.id.clone(), Some(path));
    }

    group.bench_function("create_update_all_blocks", |b| {
        b.iter(|| std::hint::black_box(create_update(&doc, std::hint::black_box(&all_dirty))));
    });

    group.bench_function("typing_then_save", |b| {
        b.iter(|| {
            let mut editor = Editor::new(doc.clone());
            for i in 0..20 {
                let cmd = Cmd::InsertText {
                    at: Point::new([0, i, 0, 0], 0),
                    text: std::hint::black_box("x".to_string()),
                };
                let _ = editor.apply(cmd);
            }
            let update = create_update(editor.document(), editor.dirty());
            std::hint::black_box(update);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_create_update);
criterion_main!(benches);
