//! Benchmarks for the per-cell and per-unit stages

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::{LineString, MultiPolygon, Polygon};
use nightglow_algorithms::change::{change_rasters, ChangeParams};
use nightglow_algorithms::imagery::log_compress;
use nightglow_algorithms::statistics::aggregate_stack;
use nightglow_core::{AdminLevel, Boundary, GeoTransform, Period, Raster, RasterStack, Reduction};

fn create_radiance(size: usize, base: f64) -> Raster<f64> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
    for row in 0..size {
        for col in 0..size {
            let v = base + ((row * 7 + col * 13) % 200) as f64 / 4.0;
            r.set(row, col, v).unwrap();
        }
    }
    r
}

/// Four quadrant units covering the grid
fn quadrants(size: usize) -> Vec<Boundary> {
    let h = size as f64 / 2.0;
    let mut out = Vec::new();
    for (i, (x0, y0)) in [(0.0, 0.0), (h, 0.0), (0.0, h), (h, h)].into_iter().enumerate() {
        let poly = Polygon::new(
            LineString::from(vec![(x0, y0), (x0 + h, y0), (x0 + h, y0 + h), (x0, y0 + h), (x0, y0)]),
            vec![],
        );
        out.push(Boundary::new(format!("Q{i}"), AdminLevel::Adm1, MultiPolygon::new(vec![poly])));
    }
    out
}

fn bench_log_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("imagery/log_compress");
    for size in [256, 512, 1024] {
        let raster = create_radiance(size, 0.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| log_compress(black_box(&raster)).unwrap())
        });
    }
    group.finish();
}

fn bench_change(c: &mut Criterion) {
    let mut group = c.benchmark_group("change/rasters");
    let params = ChangeParams::pixel();
    for size in [256, 512, 1024] {
        let observed = create_radiance(size, 5.0);
        let baseline = create_radiance(size, 0.0);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| change_rasters(black_box(&observed), black_box(&baseline), &params).unwrap())
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics/aggregate_stack");
    for size in [256, 512] {
        let mut stack = RasterStack::new();
        for month in 1..=12 {
            let period = Period::month(2023, month).unwrap();
            stack.insert(period, create_radiance(size, month as f64).with_period(period));
        }
        let units = quadrants(size);
        let refs: Vec<&Boundary> = units.iter().collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| aggregate_stack(black_box(&stack), &refs, Reduction::Sum).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_log_compress, bench_change, bench_aggregate);
criterion_main!(benches);
