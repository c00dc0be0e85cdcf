//! Errors reported by configuration-time calls.
//!
//! Nothing on the audio path returns these. Real-time operations degrade
//! instead (oldest samples dropped, voices stolen, indices clamped), so the
//! only fallible calls are the ones that allocate or parse.

use thiserror::Error;

/// Error type for setup and configuration failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The allocator refused a buffer of the requested size.
    #[error("failed to allocate {requested} samples")]
    Allocation { requested: usize },

    /// The requested size cannot be rounded up to a power of two.
    #[error("capacity overflow rounding {requested} samples to a power of two")]
    CapacityOverflow { requested: usize },

    /// A protocol name that is neither "MIDI" nor "MPE".
    #[error("unknown input protocol: {0}")]
    UnknownProtocol(String),

    /// Sample rates must be finite and positive.
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f32),

    /// A host buffer larger than the adapter was built for.
    #[error("block of {frames} frames exceeds maximum of {max}")]
    BlockTooLarge { frames: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
