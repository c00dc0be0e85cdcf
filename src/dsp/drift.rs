//! Slow random pitch wander.
//!
//! Every so often the generator picks a new random target in [-1, 1] and
//! glides to it over one drift period. Intervals between picks are
//! exponentially distributed around the configured mean, so the movement
//! has no audible regular rhythm. Work is done once per block; the glide
//! fills in the samples.

use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{dsp::glide::LinearGlide, frame::Frame, FRAME_SIZE};

#[derive(Debug, Clone)]
pub struct Drift {
    rng: SmallRng,
    glide: LinearGlide,
    target: f32,
    mean_interval: f32,
    counter: usize,
    next_change: usize,
}

impl Drift {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            glide: LinearGlide::new(),
            target: 0.0,
            mean_interval: 0.0,
            counter: 0,
            next_change: 0,
        }
    }

    /// Mean time between new targets, which is also the glide time to each
    /// target.
    pub fn set_period_in_samples(&mut self, samples: f32) {
        self.mean_interval = samples.max(0.0);
        self.glide.set_glide_time_in_samples(samples);
    }

    /// Restart from zero with a fresh random sequence.
    pub fn reset(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
        self.glide.set_value(0.0);
        self.target = 0.0;
        self.counter = 0;
        self.next_change = 0;
    }

    /// Advance one block and return the drift signal, in [-1, 1].
    pub fn process(&mut self) -> Frame {
        self.counter += FRAME_SIZE;
        if self.counter >= self.next_change {
            self.target = self.rng.gen_range(-1.0..=1.0);
            self.counter = 0;

            // exponential interval with the configured mean
            let u: f32 = self.rng.gen();
            let interval = -(1.0 - u).ln() * self.mean_interval;
            self.next_change = (interval as usize).max(FRAME_SIZE);
        }
        self.glide.process(self.target)
    }
}
