use criterion::{criterion_group, criterion_main, Criterion};

fn bench_months(c: &mut Criterion) {
    let config = sim_core::SimConfig {
        rng_seed: 42,
        start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    };
    let base = sim_runtime::Session::new(config);
    c.bench_function("session 12 months", |b| {
        b.iter(|| {
            let mut session = base.clone();
            let _ = session.run_months(12);
        })
    });
}

criterion_group!(benches, bench_months);
criterion_main!(benches);
