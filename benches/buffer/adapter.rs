//! Benchmarks for bridging host buffers to fixed blocks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rtsignals::{buffer::BlockAdapter, Frame};

pub fn bench_adapter(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer/adapter");

    // Host sizes that are not multiples of the block size are the common case
    for &size in &[100usize, 127, 256, 441] {
        let mut adapter = BlockAdapter::new(2, 2, 1024).unwrap();
        let left: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin()).collect();
        let right = left.clone();
        let mut out_left = vec![0.0f32; size];
        let mut out_right = vec![0.0f32; size];

        group.bench_with_input(BenchmarkId::new("stereo_through", size), &size, |b, _| {
            b.iter(|| {
                let inputs = [left.as_slice(), right.as_slice()];
                let mut outputs = [out_left.as_mut_slice(), out_right.as_mut_slice()];
                adapter.process(
                    black_box(&inputs),
                    black_box(&mut outputs),
                    size,
                    |ins: &[Frame], outs: &mut [Frame], _offset| {
                        for (o, i) in outs.iter_mut().zip(ins) {
                            *o = *i * 0.5;
                        }
                    },
                );
            })
        });
    }

    group.finish();
}
