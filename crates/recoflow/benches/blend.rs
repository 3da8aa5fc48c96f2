use criterion::{criterion_group, criterion_main, Criterion};
use recoflow_core::{blend, ScoreBlender, ScoreMap};
use std::hint::black_box;

fn score_map(items: usize, seed: u64) -> ScoreMap {
    (0..items)
        .map(|i| {
            let v = ((i as u64).wrapping_mul(2_654_435_761).wrapping_add(seed) % 1000) as f64;
            (format!("item{}", i), v)
        })
        .collect()
}

fn bench_blend_three_sources(c: &mut Criterion) {
    let sources = vec![
        (score_map(1000, 1), 0.6),
        (score_map(1000, 2), 0.3),
        (score_map(200, 3), 0.1),
    ];

    c.bench_function("blend_3_sources_1k_items", |b| {
        b.iter(|| blend(black_box(&sources), 10));
    });
}

fn bench_blend_named(c: &mut Criterion) {
    let blender = ScoreBlender::default();
    let sources = vec![
        ("collaborative", score_map(1000, 4)),
        ("content", score_map(1000, 5)),
        ("trending", score_map(50, 6)),
    ];

    c.bench_function("blend_named_default_weights", |b| {
        b.iter(|| blender.blend_named(black_box(&sources)));
    });
}

criterion_group!(benches, bench_blend_three_sources, bench_blend_named);
criterion_main!(benches);
