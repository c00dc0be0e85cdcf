//! Benchmarks for the events-to-signals engine.

mod engine;

pub use engine::bench_engine;
