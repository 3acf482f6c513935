use criterion::{criterion_group, criterion_main, Criterion};

extern crate fluxrun_core;

use fluxrun_core::flux_analysis::flux_variability_analysis;
use fluxrun_core::test_models::create_test_model;

fn read_ecoli() {
    create_test_model("ecoli").unwrap();
}

fn optimize_ecoli() {
    let model = create_test_model("ecoli").unwrap();
    model.optimize().unwrap();
}

fn fva_ecoli() {
    let model = create_test_model("ecoli").unwrap();
    flux_variability_analysis(&model, None, 1.0).unwrap();
}

fn read_benchmark(c: &mut Criterion) {
    c.bench_function("Read E. coli central", |b| b.iter(read_ecoli));
}

fn optimize_benchmark(c: &mut Criterion) {
    c.bench_function("Optimize E. coli central", |b| b.iter(optimize_ecoli));
}

fn fva_benchmark(c: &mut Criterion) {
    c.bench_function("FVA E. coli central", |b| b.iter(fva_ecoli));
}

criterion_group!(benches, optimize_benchmark, read_benchmark, fva_benchmark);
criterion_main!(benches);
