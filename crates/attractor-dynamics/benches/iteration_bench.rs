// ─────────────────────────────────────────────────────────────────────
// Attractor Kernel — Iteration Benchmarks
// ─────────────────────────────────────────────────────────────────────
//! Criterion benchmarks for the map hot path. The step is called
//! hundreds of millions of times per render, so it must stay
//! allocation-free.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use attractor_dynamics::{ncoeffs, run, run_final, PolynomialMap};

fn make_coefficients(dimension: usize) -> Vec<f64> {
    (0..ncoeffs(dimension))
        .map(|i| ((i as f64 * 0.37).sin() * 10.0).round() / (10.0 + 2.0 * dimension as f64))
        .collect()
}

fn make_state(dimension: usize) -> Vec<f64> {
    (0..=dimension).map(|i| 0.01 * i as f64).collect()
}

fn bench_step(c: &mut Criterion) {
    for d in [2usize, 4, 7] {
        let mut map = PolynomialMap::new(d, make_coefficients(d)).unwrap();
        let state = make_state(d);
        let mut next = vec![0.0; d + 1];
        c.bench_function(&format!("step_d{d}"), |b| {
            b.iter(|| map.step_into(black_box(&state), &mut next))
        });
    }
}

fn bench_run_recorded(c: &mut Criterion) {
    let mut map = PolynomialMap::new(3, make_coefficients(3)).unwrap();
    let state = make_state(3);
    c.bench_function("run_d3_100k", |b| {
        b.iter(|| run(&mut map, black_box(100_000), &state))
    });
}

fn bench_run_final(c: &mut Criterion) {
    let mut map = PolynomialMap::new(3, make_coefficients(3)).unwrap();
    let state = make_state(3);
    c.bench_function("run_final_d3_100k", |b| {
        b.iter(|| run_final(&mut map, black_box(100_000), &state))
    });
}

criterion_group!(benches, bench_step, bench_run_recorded, bench_run_final);
criterion_main!(benches);
