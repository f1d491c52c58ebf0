//! Paging Benchmarks
//!
//! Hot-path costs of the paging engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;
use sparsetex_core::{IndirectionTable, PagingConfig, PagingEngine, WorldPositionDriver};

fn engine(capacity: u32) -> PagingEngine {
    PagingEngine::new(&PagingConfig {
        page_count_x: 256,
        page_count_y: 256,
        tile_capacity: capacity,
        mip_count: 9,
        max_tile_capacity: 4096,
    })
    .unwrap()
}

fn bench_activate_resident(c: &mut Criterion) {
    let mut engine = engine(256);
    for x in 0..16 {
        for y in 0..16 {
            engine.activate(x, y, 0);
        }
    }

    c.bench_function("activate_resident", |b| {
        let mut i = 0i32;
        b.iter(|| {
            engine.activate(black_box(i & 15), black_box((i >> 4) & 15), 0);
            i = i.wrapping_add(1);
        });
    });
}

fn bench_activate_evicting(c: &mut Criterion) {
    let mut group = c.benchmark_group("activate_evicting");

    for capacity in [64u32, 256, 1024].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), capacity, |b, &capacity| {
            let mut engine = engine(capacity);
            let mut i = 0i32;
            b.iter(|| {
                // Walk the whole mip-0 grid so every request misses
                engine.activate(black_box(i & 255), black_box((i >> 8) & 255), 0);
                i = i.wrapping_add(1);
            });
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    for capacity in [64u32, 256, 1024].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), capacity, |b, &capacity| {
            let mut engine = engine(capacity);
            for i in 0..capacity as i32 {
                engine.activate(i & 255, i >> 8, (i % 9).min(8));
            }
            let mut tiles = Vec::with_capacity(capacity as usize);

            b.iter(|| {
                engine.snapshot_into(&mut tiles);
                black_box(tiles.len());
            });
        });
    }

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut engine = engine(256);
    let mut table = IndirectionTable::new(&engine).unwrap();
    let driver = WorldPositionDriver {
        scale: Vec2::splat(256.0),
        ..Default::default()
    };

    c.bench_function("frame_update", |b| {
        let mut frame = 0u32;
        b.iter(|| {
            let position = Vec2::new((frame % 1000) as f32 * 0.1 - 50.0, 0.0);
            driver.update(position, &mut engine);
            black_box(table.update(&mut engine));
            frame = frame.wrapping_add(1);
        });
    });
}

criterion_group!(
    benches,
    bench_activate_resident,
    bench_activate_evicting,
    bench_snapshot,
    bench_frame,
);
criterion_main!(benches);
