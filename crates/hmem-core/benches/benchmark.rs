//! Performance benchmarks for hmem
//!
//! Run with: cargo bench --package hmem-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hmem_core::{Buffer, Residency};

fn bench_buffer_alloc(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_alloc");

    for size in [1024usize, 4096, 65536, 1048576].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let buf = Buffer::<u8>::alloc(size, Residency::Pageable).unwrap();
                black_box(buf);
            });
        });
    }
    group.finish();
}

fn bench_buffer_write_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_write_read");

    for size in [1024usize, 4096, 65536].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut buf = Buffer::<u8>::alloc(size, Residency::Pageable).unwrap();
            let data = vec![42u8; size];

            b.iter(|| {
                buf.host_slice_mut().copy_from_slice(&data);
                let sum: u64 = buf.host_slice().iter().map(|&x| x as u64).sum();
                black_box(sum);
            });
        });
    }
    group.finish();
}

fn bench_buffer_clone(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_clone");

    for size in [4096usize, 65536, 1048576].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut buf = Buffer::<u8>::alloc(size, Residency::Pageable).unwrap();
            buf.host_slice_mut().fill(0x5A);

            b.iter(|| {
                let clone = buf.try_clone().unwrap();
                black_box(clone);
            });
        });
    }
    group.finish();
}

fn bench_dump_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("dump_load");
    group.sample_size(50);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.bin");
    let size = 65536usize;
    group.throughput(Throughput::Bytes(size as u64));

    let mut buf = Buffer::<u8>::alloc(size, Residency::Pageable).unwrap();
    buf.host_slice_mut().fill(7);

    group.bench_function("dump", |b| {
        b.iter(|| buf.dump(&path).unwrap());
    });

    buf.dump(&path).unwrap();
    group.bench_function("load", |b| {
        b.iter(|| {
            let loaded = Buffer::<u8>::load(&path).unwrap();
            black_box(loaded);
        });
    });

    group.finish();
}

#[cfg(feature = "cuda")]
fn bench_migration(c: &mut Criterion) {
    let mut group = c.benchmark_group("migration");
    group.sample_size(50);

    for size in [65536usize, 1048576].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let mut buf = Buffer::<u8>::alloc(size, Residency::Pageable).unwrap();
            buf.host_slice_mut().fill(1);

            b.iter(|| {
                buf.to_device().unwrap();
                buf.to_host().unwrap();
            });
        });
    }
    group.finish();
}

#[cfg(feature = "cuda")]
criterion_group!(
    benches,
    bench_buffer_alloc,
    bench_buffer_write_read,
    bench_buffer_clone,
    bench_dump_load,
    bench_migration
);
#[cfg(not(feature = "cuda"))]
criterion_group!(
    benches,
    bench_buffer_alloc,
    bench_buffer_write_read,
    bench_buffer_clone,
    bench_dump_load
);
criterion_main!(benches);
