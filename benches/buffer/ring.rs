//! Benchmarks for ring buffer transfers.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rtsignals::buffer::RingBuffer;

use crate::BLOCK_SIZES;

pub fn bench_ring(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer/ring");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut output = vec![0.0f32; size];

        // Write then read one block: the steady state between two threads
        let mut ring = RingBuffer::with_capacity(size * 4).unwrap();
        group.bench_with_input(BenchmarkId::new("write_read", size), &size, |b, _| {
            b.iter(|| {
                ring.write(black_box(&input));
                black_box(ring.read(black_box(&mut output)));
            })
        });

        // Overflowing writes push the reader forward every call
        let mut full = RingBuffer::with_capacity(size).unwrap();
        full.write(&input);
        group.bench_with_input(BenchmarkId::new("write_overflow", size), &size, |b, _| {
            b.iter(|| {
                full.write(black_box(&input));
            })
        });

        // Overlap-add at 50%, as in STFT resynthesis
        let mut ola = RingBuffer::with_capacity(size * 4).unwrap();
        let hop = size / 2;
        let mut hop_out = vec![0.0f32; hop];
        group.bench_with_input(BenchmarkId::new("overlap_add", size), &size, |b, _| {
            b.iter(|| {
                ola.write_with_overlap_add(black_box(&input), size - hop);
                black_box(ola.read(black_box(&mut hop_out)));
            })
        });

        // Scope-style peek of the newest block
        let mut scope = RingBuffer::with_capacity(size * 4).unwrap();
        scope.write(&vec![0.5; size * 4]);
        group.bench_with_input(BenchmarkId::new("peek_most_recent", size), &size, |b, _| {
            b.iter(|| {
                black_box(scope.peek_most_recent(black_box(&mut output)));
            })
        });
    }

    group.finish();
}
