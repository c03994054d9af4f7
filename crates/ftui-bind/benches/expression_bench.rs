//! Benchmarks for expression compilation and evaluation.
//!
//! Expressions compile once at bind time and evaluate on every render, so
//! evaluation is the hot path.
//!
//! Run with: cargo bench -p ftui-bind --bench expression_bench

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use ftui_bind::{ObservableRecord, Record, Value, parse};
use std::hint::black_box;

const EXPRESSIONS: [(&str, &str); 4] = [
    ("field", "{firstName}"),
    ("template", "{firstName} {lastName} ({age})"),
    ("compare", "{age} >= 18 && {age} < 65"),
    ("arithmetic", "({age} + 5) * 2 % 7"),
];

// =============================================================================
// Compilation
// =============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("expression/parse");
    for (name, expr) in EXPRESSIONS {
        group.bench_with_input(BenchmarkId::new("parse", name), expr, |b, expr| {
            b.iter(|| black_box(parse(black_box(expr))))
        });
    }
    group.finish();
}

// =============================================================================
// Evaluation
// =============================================================================

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("expression/evaluate");
    let record = Record::with_fields([
        ("firstName", Value::from("Joe")),
        ("lastName", Value::from("Smith")),
        ("age", Value::from(30)),
    ]);
    for (name, expr) in EXPRESSIONS {
        let Ok(compiled) = parse(expr) else {
            continue;
        };
        group.bench_with_input(
            BenchmarkId::new("evaluate", name),
            &compiled,
            |b, compiled| {
                let target: &dyn ObservableRecord = &*record;
                b.iter(|| black_box(compiled.accessor.evaluate(black_box(target))))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_evaluate);
criterion_main!(benches);
