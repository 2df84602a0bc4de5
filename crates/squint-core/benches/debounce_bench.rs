//! Criterion benchmarks for the damage debounce path.
//!
//! A busy desktop delivers hundreds of damage notifications per second;
//! [`Debouncer::try_refresh`] and the damage clip run for each one.
//!
//! Run with:
//! ```bash
//! cargo bench --package squint-core --bench debounce_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use squint_core::domain::refresh::clip_damage;
use squint_core::{Debouncer, Rect};

fn bench_try_refresh_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("try_refresh_burst");

    for &period in &[0u64, 20, 40] {
        group.bench_with_input(BenchmarkId::new("min_period_ms", period), &period, |b, &p| {
            b.iter(|| {
                let mut d = Debouncer::new(p);
                let mut t = 0u64;
                for _ in 0..256 {
                    t += 3;
                    let decision = d.try_refresh(black_box(t));
                    if let squint_core::RefreshDecision::Defer { token, .. } = decision {
                        d.on_deferred_fired(token);
                    }
                }
                d
            })
        });
    }

    group.finish();
}

fn bench_clip_damage(c: &mut Criterion) {
    let source = Rect::new(1920, 0, 1920, 1080);
    c.bench_function("clip_damage", |b| {
        b.iter(|| clip_damage(black_box(Rect::new(1800, 500, 300, 40)), black_box(&source)))
    });
}

criterion_group!(benches, bench_try_refresh_burst, bench_clip_damage);
criterion_main!(benches);
