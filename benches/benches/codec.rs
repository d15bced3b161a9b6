//! Benchmark suite for the cimbar whole-page codec and its Reed-Solomon block primitive.
//!
//! Run with: cargo bench --manifest-path benches/Cargo.toml

use std::hint::black_box;

use cimbar_benches::{generate_payload, sizes};
use cimbar_core::palette::PaletteVariant;
use cimbar_core::pipeline::{rs_decode_block, rs_encode_block};
use cimbar_core::{decode, encode};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn bench_encode(c: &mut Criterion) {
	let mut group = c.benchmark_group("encode");

	for (name, len) in [("small", sizes::SMALL), ("medium", sizes::MEDIUM), ("large", sizes::LARGE)] {
		let payload = generate_payload(len);
		group.throughput(Throughput::Bytes(len as u64));
		group.bench_with_input(BenchmarkId::new("page", name), &payload, |b, payload| {
			b.iter(|| black_box(encode(black_box(payload), PaletteVariant::Dark, 30, len > sizes::MEDIUM).unwrap()));
		});
	}

	group.finish();
}

fn bench_decode(c: &mut Criterion) {
	let mut group = c.benchmark_group("decode");

	for (name, len) in [("small", sizes::SMALL), ("medium", sizes::MEDIUM), ("large", sizes::LARGE)] {
		let fountain = len > sizes::MEDIUM;
		let payload = generate_payload(len);
		let img = encode(&payload, PaletteVariant::Dark, 30, fountain).unwrap();
		group.throughput(Throughput::Bytes(len as u64));
		group.bench_with_input(BenchmarkId::new("page", name), &img, |b, img| {
			b.iter(|| {
				black_box(decode(black_box(img), PaletteVariant::Dark, 30, fountain, cimbar_core::deskew::DeskewLevel::Skip).unwrap())
			});
		});
	}

	group.finish();
}

fn bench_rs_block(c: &mut Criterion) {
	let mut group = c.benchmark_group("reed_solomon_block");
	let ecc = 30;
	let data = generate_payload(155 - ecc);

	group.bench_function("encode_block", |b| {
		b.iter(|| black_box(rs_encode_block(black_box(&data), ecc)));
	});

	let encoded = rs_encode_block(&data, ecc);
	group.bench_function("decode_block", |b| {
		b.iter(|| black_box(rs_decode_block(black_box(&encoded), ecc)));
	});

	group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_rs_block);
criterion_main!(benches);
