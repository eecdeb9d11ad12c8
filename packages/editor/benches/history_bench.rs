//! History benchmarks
//!
//! Target: commit + undo on a 500-element document in <1ms

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use freeform_editor::{
    AddElementOptions, Document, EditorConfig, EditorSession, ElementType, History, IdGenerator,
    SectionKind, ViewportMode,
};

const TYPES: [ElementType; 5] = [
    ElementType::Heading,
    ElementType::Text,
    ElementType::Button,
    ElementType::Image,
    ElementType::Divider,
];

fn build_document(num_sections: usize, per_section: usize) -> Document {
    let mut doc = Document::new(IdGenerator::from_seed("bench"));
    for _ in 1..num_sections {
        doc.add_section(0, SectionKind::Blank, None).unwrap();
    }

    let sections: Vec<_> = doc.current_page().sections.iter().map(|s| s.id.clone()).collect();
    for section in sections {
        for i in 0..per_section {
            doc.add_element(
                TYPES[i % TYPES.len()],
                (i * 37 % 900) as f64,
                0.0,
                ViewportMode::Desktop,
                1200.0,
                600.0,
                AddElementOptions::in_section(section.clone()),
            )
            .unwrap();
        }
    }
    doc
}

fn commit_and_undo(c: &mut Criterion) {
    let mut doc = build_document(10, 50);
    let first = doc.elements()[0].id.clone();
    let mut history = History::new(doc.snapshot(), 50);

    c.bench_function("commit_undo_500_elements", |b| {
        b.iter(|| {
            doc.update_position(&first, 10.0, 10.0).unwrap();
            history.commit(doc.snapshot());
            let previous = history.undo(doc.snapshot()).unwrap();
            doc.restore(black_box(previous));
        })
    });
}

fn snapshot_only(c: &mut Criterion) {
    let doc = build_document(10, 50);

    c.bench_function("snapshot_500_elements", |b| b.iter(|| black_box(doc.snapshot())));
}

fn live_drag(c: &mut Criterion) {
    c.bench_function("session_drag_60_frames", |b| {
        b.iter(|| {
            let mut session = EditorSession::new("bench", EditorConfig::default());
            let id = session.add_element_to_section(ElementType::Image, None).unwrap();
            for frame in 0..60 {
                session.update_position(&id, frame as f64 * 5.0, 100.0);
            }
            session.commit_position_change()
        })
    });
}

criterion_group!(benches, commit_and_undo, snapshot_only, live_drag);
criterion_main!(benches);
