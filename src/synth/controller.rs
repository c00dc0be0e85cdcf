use crate::{dsp::glide::LinearGlide, frame::Frame};

/// Number of continuous controllers tracked, indexed by CC number.
pub const NUM_CONTROLLERS: usize = 128;

/// One continuous controller: the last raw value received and a smoothed
/// block-rate signal following it.
#[derive(Debug, Clone, Default)]
pub struct ControllerSmoother {
    raw_value: f32,
    glide: LinearGlide,
    output: Frame,
}

impl ControllerSmoother {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_glide_time_in_samples(&mut self, samples: f32) {
        self.glide.set_glide_time_in_samples(samples);
    }

    pub fn set_raw_value(&mut self, value: f32) {
        self.raw_value = value;
    }

    /// Advance one block towards the raw value.
    pub fn process(&mut self) {
        self.output = self.glide.process(self.raw_value);
    }

    pub fn reset(&mut self) {
        self.raw_value = 0.0;
        self.glide.set_value(0.0);
        self.output.fill(0.0);
    }

    pub fn raw_value(&self) -> f32 {
        self.raw_value
    }

    pub fn output(&self) -> &Frame {
        &self.output
    }
}
