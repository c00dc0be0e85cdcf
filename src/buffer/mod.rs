//! Sample transport between threads and between block sizes.
//!
//! Everything here is allocation-free after construction and never blocks,
//! so both sides may run on real-time threads.

/// Host-size to frame-size bridging built on per-channel rings.
pub mod adapter;
/// Single-producer/single-consumer lock-free sample ring.
pub mod ring;

pub use adapter::BlockAdapter;
pub use ring::{RingBuffer, RingReader, RingWriter};
