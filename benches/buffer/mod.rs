//! Benchmarks for sample rings and block adapters.

mod adapter;
mod ring;

pub use adapter::bench_adapter;
pub use ring::bench_ring;
