//! # Strategy Benchmark

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use eqpt_if::SensorData;
use trail_lib::{
    params::{StrategyKind, TrailExecParams},
    per::strategy_from_params,
    sim::render_trail,
    snapshot::FrameSnapshot,
};

fn strategy_benchmark(c: &mut Criterion) {
    // ---- Build a synthetic frame ----

    let snapshot = Arc::new(FrameSnapshot::new(
        render_trail(320, 240, 24, 120, 30.0),
        SensorData {
            ultrasonic_cm: 100.0,
        },
    ));

    // ---- Benchmark each strategy ----

    let mut params = TrailExecParams::default();
    params.per.blur_radius = 1;

    for (name, kind) in [
        ("trail_following", StrategyKind::TrailFollowing),
        ("horizontal_band", StrategyKind::HorizontalBand),
    ]
    .iter()
    {
        params.exec.strategy = *kind;
        let mut strategy = strategy_from_params(&params, None);

        c.bench_function(name, |b| {
            b.iter(|| {
                strategy.prepare(snapshot.clone());
                strategy.evaluate().unwrap()
            })
        });
    }
}

criterion_group!(benches, strategy_benchmark);
criterion_main!(benches);
