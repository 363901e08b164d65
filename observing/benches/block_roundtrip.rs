use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;
use ts_observing::{
    AirmassConstraint, Band, ObservingBlock, ObservingScript, SeeingConstraint,
    SkyBrightnessConstraint,
};

fn build_block(n_constraints: usize) -> ObservingBlock {
    let script = ObservingScript::new("standard_visit", false, Default::default())
        .with_parameter("exptime", json!(30.0))
        .with_parameter("target", json!("10:20:30"));
    let mut block = ObservingBlock::new("bench", "BENCH", vec![script; 4]);
    for i in 0..n_constraints {
        match i % 3 {
            0 => block.add_constraint(AirmassConstraint::new(1.0 + i as f64 * 0.1).unwrap()),
            1 => block.add_constraint(SeeingConstraint::new(0.5).unwrap()),
            _ => block.add_constraint(SkyBrightnessConstraint::new(20.0, Band::R).unwrap()),
        }
    }
    block
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_round_trip");

    for n in [1usize, 10, 100] {
        let block = build_block(n);
        let json = block.to_json().unwrap();

        group.bench_with_input(BenchmarkId::new("serialize", n), &block, |b, block| {
            b.iter(|| black_box(block.to_json().unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("deserialize", n), &json, |b, json| {
            b.iter(|| black_box(ObservingBlock::from_json(black_box(json)).unwrap()));
        });
    }

    group.finish();
}

fn bench_script_configuration(c: &mut Criterion) {
    let script = ObservingScript::new("track_target", true, Default::default())
        .with_parameter("ra", json!("10:20:30"))
        .with_parameter("dec", json!("-30:00:00"))
        .with_parameter("filters", json!(["g", "r", "i"]));

    c.bench_function("script_configuration", |b| {
        b.iter(|| black_box(script.get_script_configuration().unwrap()));
    });
}

criterion_group!(benches, bench_round_trip, bench_script_configuration);
criterion_main!(benches);
