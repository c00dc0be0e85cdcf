//! Messages between the UI and the render thread
//!
//! Everything here is Copy so it can cross an rtrb ring without allocating.

use rtsignals::synth::{engine::MAX_VOICES, Protocol};

/// Commands sent from UI thread to render thread
#[derive(Clone, Copy, Debug)]
pub enum ControlMessage {
    ToggleUnison,
    ToggleGlide,
    ToggleProtocol,
}

/// One voice as of the end of the last block
#[derive(Clone, Copy, Debug, Default)]
pub struct VoiceStatus {
    /// Owning key or channel, 0 = free
    pub key: usize,
    pub gate: f32,
    /// Octaves from A4
    pub pitch: f32,
    /// Seconds since note-on
    pub elapsed: f32,
}

/// Snapshot sent from render thread to UI
#[derive(Clone, Copy, Debug, Default)]
pub struct EngineStatus {
    pub protocol: Protocol,
    pub unison: bool,
    pub glide: bool,
    pub sustain: bool,
    pub polyphony: usize,
    pub newest_voice: usize,
    pub sample_rate: f32,
    /// Samples queued for the device when the status was taken
    pub buffered: usize,
    pub buffer_capacity: usize,
    pub voices: [VoiceStatus; MAX_VOICES],
}
