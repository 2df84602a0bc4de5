//! Criterion benchmarks for the per-motion geometry path.
//!
//! Every raw pointer event runs [`PointerTracker::on_pointer_moved`] followed
//! by [`adjust_offset`], so both must stay far below a frame.
//!
//! Run with:
//! ```bash
//! cargo bench --package squint-core --bench viewport_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use squint_core::{
    adjust_offset, select_monitors, CursorPosition, Monitor, Point, PointerTracker, Rect, Size,
};

// ── Benchmarks: adjust_offset ─────────────────────────────────────────────────

fn bench_adjust_offset(c: &mut Criterion) {
    let source = Size::new(3840, 2160);
    let window = Size::new(1820, 980);
    let mut group = c.benchmark_group("adjust_offset");

    group.bench_function("panning_cursor_inside", |b| {
        b.iter(|| {
            adjust_offset(
                black_box(Point::new(-400, -200)),
                black_box(source),
                black_box(window),
                black_box(CursorPosition::Inside(Point::new(3000, 1500))),
            )
        })
    });

    group.bench_function("panning_cursor_outside", |b| {
        b.iter(|| {
            adjust_offset(
                black_box(Point::new(-400, -200)),
                black_box(source),
                black_box(window),
                black_box(CursorPosition::Outside),
            )
        })
    });

    group.bench_function("static_centre", |b| {
        b.iter(|| {
            adjust_offset(
                black_box(Point::default()),
                black_box(Size::new(1280, 720)),
                black_box(window),
                black_box(CursorPosition::Inside(Point::new(10, 10))),
            )
        })
    });

    group.finish();
}

// ── Benchmarks: pointer tracking ──────────────────────────────────────────────

fn bench_pointer_tracking(c: &mut Criterion) {
    let mut tracker = PointerTracker::new(Rect::new(0, 0, 1920, 1080));
    let mut x = 0;

    c.bench_function("pointer_tracker_on_pointer_moved", |b| {
        b.iter(|| {
            x = (x + 7) % 2400;
            tracker.on_pointer_moved(black_box(Point::new(x, 500)), false)
        })
    });
}

// ── Benchmarks: monitor selection ─────────────────────────────────────────────

fn bench_select_monitors_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_monitors_scaling");

    for &count in &[2usize, 4, 8] {
        let monitors: Vec<Monitor> = (0..count)
            .map(|i| Monitor::new(format!("DP-{i}"), Rect::new(1920 * i as i32, 0, 1920, 1080)))
            .collect();

        group.bench_with_input(BenchmarkId::new("monitors", count), &monitors, |b, m| {
            b.iter(|| select_monitors(None, None, black_box(m)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_adjust_offset,
    bench_pointer_tracking,
    bench_select_monitors_scaling
);
criterion_main!(benches);
