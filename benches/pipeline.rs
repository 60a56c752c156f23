use criterion::{criterion_group, criterion_main, Criterion};
use mandelbrot::{render, render_serial, GridSpec, PipelineConfig};

fn pipeline(c: &mut Criterion) {
    let grid = GridSpec::new(200, 300, 500).unwrap();
    let config = PipelineConfig::new();
    c.bench_function("pipeline 200x300x500", move |b| {
        b.iter(|| render(&grid, &config).unwrap())
    });
}

fn serial(c: &mut Criterion) {
    let grid = GridSpec::new(200, 300, 500).unwrap();
    c.bench_function("serial 200x300x500", move |b| b.iter(|| render_serial(&grid)));
}

criterion_group!(benches, pipeline, serial);
criterion_main!(benches);
