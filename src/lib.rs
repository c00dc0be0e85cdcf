pub mod buffer; // Lock-free sample rings and host block adapters
pub mod config;
pub mod dsp;
pub mod error;
pub mod frame;
pub mod io;
pub mod synth; // Events, voices and the events-to-signals engine

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use frame::Frame;

/// Samples per processing block. Every real-time computation in the crate
/// runs in chunks of exactly this many samples.
pub const FRAME_SIZE: usize = 64;

/// Largest host buffer handled in one piece. Device callbacks longer than
/// this are split into chunks of at most this many frames.
pub const MAX_BLOCK_SIZE: usize = 2048;
