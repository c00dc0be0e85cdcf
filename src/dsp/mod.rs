//! Low-level control-signal primitives used by the voice engine.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside voice structs.

/// Per-voice random pitch wander.
pub mod drift;
/// Linear glide (portamento) smoother, per sample or per block.
pub mod glide;

pub use drift::Drift;
pub use glide::LinearGlide;
