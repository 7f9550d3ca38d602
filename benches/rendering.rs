//! Benchmarks for line layout.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use htmltext::document::parse;
use htmltext::layout::{RenderOptions, render};

fn bench_render_sample(c: &mut Criterion) {
    let parsed = parse(include_str!("../tests/fixtures/sample.html"));
    let options = RenderOptions::default();

    c.bench_function("render_sample", |b| {
        b.iter(|| render(black_box(&parsed.root), black_box(&options)))
    });
}

fn bench_render_long_paragraph(c: &mut Criterion) {
    let html = format!("<p>{}</p>", "lorem ipsum 加粗文字 dolor ".repeat(200));
    let parsed = parse(&html);
    let options = RenderOptions::default().with_max_width(360.0);

    c.bench_function("render_long_paragraph", |b| {
        b.iter(|| render(black_box(&parsed.root), black_box(&options)))
    });
}

criterion_group!(benches, bench_render_sample, bench_render_long_paragraph);
criterion_main!(benches);
