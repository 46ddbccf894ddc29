//! Benchmarks for package document binding.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use opfbind::bind::{decode_document, encode_document};
use opfbind::model::Package;
use opfbind::xml::{WriteOptions, parse_document, to_bytes};

const EPUB3_OPF: &[u8] = include_bytes!("../tests/fixtures/epub3_package.opf");
const EPUB2_OPF: &[u8] = include_bytes!("../tests/fixtures/epub2_package.opf");

// ============================================================================
// Tree stage
// ============================================================================

fn bench_parse_tree(c: &mut Criterion) {
    c.bench_function("parse_tree", |b| {
        b.iter(|| parse_document(black_box(EPUB3_OPF)).unwrap());
    });
}

fn bench_write_tree(c: &mut Criterion) {
    let doc = parse_document(EPUB3_OPF).unwrap();
    let options = WriteOptions::default();

    c.bench_function("write_tree", |b| {
        b.iter(|| to_bytes(black_box(&doc), &options));
    });
}

// ============================================================================
// Binding stage
// ============================================================================

fn bench_decode_package(c: &mut Criterion) {
    let epub3 = parse_document(EPUB3_OPF).unwrap();
    let epub2 = parse_document(EPUB2_OPF).unwrap();

    let mut group = c.benchmark_group("decode_package");
    group.bench_function("epub3", |b| {
        b.iter(|| decode_document::<Package>(black_box(&epub3)).unwrap());
    });
    group.bench_function("epub2", |b| {
        b.iter(|| decode_document::<Package>(black_box(&epub2)).unwrap());
    });
    group.finish();
}

fn bench_encode_package(c: &mut Criterion) {
    let package: Package = opfbind::from_bytes(EPUB3_OPF).unwrap();

    c.bench_function("encode_package", |b| {
        b.iter(|| encode_document(black_box(&package)).unwrap());
    });
}

// ============================================================================
// End to end
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let options = WriteOptions::compact();

    c.bench_function("round_trip", |b| {
        b.iter(|| {
            let package: Package = opfbind::from_bytes(black_box(EPUB3_OPF)).unwrap();
            opfbind::to_bytes(&package, &options).unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_parse_tree,
    bench_write_tree,
    bench_decode_package,
    bench_encode_package,
    bench_round_trip,
);
criterion_main!(benches);
