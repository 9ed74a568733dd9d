//! Propagation Benchmark
//!
//! Symbolic batch propagation against the closed-form fast path for the same
//! product, plus the one-off cost of building the derivatives.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use errprop::{Operand, build_derivatives, fast_product, propagate_batch};
use std::hint::black_box;

// =============================================================================
// Data Generator
// =============================================================================

/// Deterministic positive columns of length `n`
fn columns(n: usize, seed: f64) -> (Vec<f64>, Vec<f64>) {
    let values = (0..n).map(|i| seed + (i % 97) as f64 * 0.13).collect();
    let errors = (0..n).map(|i| 0.01 + (i % 13) as f64 * 0.002).collect();
    (values, errors)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_derivatives");

    group.bench_function("product", |b| {
        b.iter(|| build_derivatives(black_box(&["a", "b"][..]), black_box("a b")))
    });

    group.bench_function("pendulum", |b| {
        b.iter(|| build_derivatives(black_box(&["l", "g"][..]), black_box("2 Pi Sqrt[l/g]")))
    });

    group.bench_function("mixed_3", |b| {
        b.iter(|| {
            build_derivatives(
                black_box(&["x", "y", "z"][..]),
                black_box("x^2 Exp[-y/z] + Log[x y] Sin[z]"),
            )
        })
    });

    group.finish();
}

fn bench_product(c: &mut Criterion) {
    let mut group = c.benchmark_group("product_batch");

    let derivatives = build_derivatives(&["a", "b"], "a b").unwrap();

    for n in [100, 10_000, 100_000] {
        let (a, ea) = columns(n, 1.0);
        let (b, eb) = columns(n, 2.5);

        let values = [&a[..], &b[..]];
        let errors = [&ea[..], &eb[..]];

        group.bench_with_input(BenchmarkId::new("symbolic", n), &n, |bench, _| {
            bench.iter(|| {
                propagate_batch(
                    black_box(&derivatives[..]),
                    black_box(&values[..]),
                    black_box(&errors[..]),
                )
            })
        });

        group.bench_with_input(BenchmarkId::new("fast_path", n), &n, |bench, _| {
            bench.iter(|| {
                let operands = [Operand::new(&a, &ea), Operand::new(&b, &eb)];
                fast_product(black_box(&operands[..]))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_product);

criterion_main!(benches);
