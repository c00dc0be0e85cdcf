#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    synth::{engine::MAX_VOICES, protocol::Protocol},
};

/// Everything needed to set up an [`EventsToSignals`](crate::synth::EventsToSignals)
/// engine, collected in one place so it can be built, stored, or loaded
/// before the audio thread starts.
///
/// ```
/// use rtsignals::{synth::Protocol, EngineConfig};
///
/// let config = EngineConfig::default()
///     .with_sample_rate(44_100.0)
///     .with_polyphony(8)
///     .with_protocol(Protocol::Mpe);
/// assert_eq!(config.polyphony, 8);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub polyphony: usize,
    pub protocol: Protocol,
    pub unison: bool,
    pub pitch_glide_seconds: f32,
    /// 0 = none, 1 = full drift.
    pub drift_amount: f32,
    /// Pitch wheel range in MIDI mode and on the MPE main channel.
    pub pitch_bend_semitones: f32,
    /// Per-note pitch bend range in MPE mode.
    pub mpe_pitch_bend_semitones: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            polyphony: 4,
            protocol: Protocol::Midi,
            unison: false,
            pitch_glide_seconds: 0.0,
            drift_amount: 0.0,
            pitch_bend_semitones: 7.0,
            mpe_pitch_bend_semitones: 48.0,
        }
    }
}

impl EngineConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_polyphony(mut self, polyphony: usize) -> Self {
        self.polyphony = polyphony;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_unison(mut self, unison: bool) -> Self {
        self.unison = unison;
        self
    }

    pub fn with_pitch_glide_seconds(mut self, seconds: f32) -> Self {
        self.pitch_glide_seconds = seconds;
        self
    }

    pub fn with_drift_amount(mut self, amount: f32) -> Self {
        self.drift_amount = amount;
        self
    }

    pub fn with_pitch_bend_semitones(mut self, semitones: f32) -> Self {
        self.pitch_bend_semitones = semitones;
        self
    }

    pub fn with_mpe_pitch_bend_semitones(mut self, semitones: f32) -> Self {
        self.mpe_pitch_bend_semitones = semitones;
        self
    }

    /// Reject settings the engine can't run with. Polyphony is not checked
    /// here; the engine clamps it to `1..=MAX_VOICES`.
    pub fn validate(&self) -> Result<()> {
        validate_sample_rate(self.sample_rate)
    }

    /// Polyphony the engine will actually use.
    pub fn effective_polyphony(&self) -> usize {
        self.polyphony.clamp(1, MAX_VOICES)
    }
}

pub(crate) fn validate_sample_rate(sample_rate: f32) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidSampleRate(sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.sample_rate, 48_000.0);
        assert_eq!(config.protocol, Protocol::Midi);
        assert_eq!(config.pitch_bend_semitones, 7.0);
        assert_eq!(config.mpe_pitch_bend_semitones, 48.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_sample_rate() {
        let config = EngineConfig::default().with_sample_rate(0.0);
        assert_eq!(config.validate(), Err(Error::InvalidSampleRate(0.0)));
        assert!(EngineConfig::default()
            .with_sample_rate(f32::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn polyphony_is_clamped() {
        assert_eq!(EngineConfig::default().with_polyphony(0).effective_polyphony(), 1);
        assert_eq!(
            EngineConfig::default().with_polyphony(99).effective_polyphony(),
            MAX_VOICES
        );
    }
}
