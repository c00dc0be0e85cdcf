use crate::frame::Frame;

/*
Linear Glide
============

A glide (portamento, slew, smoother) turns a control value that jumps into
one that ramps. Every control signal the engine produces passes through one,
otherwise a pitch wheel flick or a new note would step instantly and click.

Vocabulary
----------

  target        The value we are heading towards. Set by the caller each
                sample or each block; may change at any time.

  glide time    How long, in samples, a full move from the current value to
                a new target takes. Zero means "jump immediately".

  step          Per-sample change while gliding:
                    step = (target - current) / glide_samples


The Shape
---------

  value
    B ┤            ┌──────────────
      │          ╱
      │        ╱
      │      ╱
    A ┼─────┘
      └─────┬──────┬─────────────→ samples
         target   glide
         changes  done

The glide is linear and always takes exactly `glide time` samples, however
far apart A and B are. A target change in the middle of a glide restarts
the ramp from wherever the value is right now, so there is never a jump.

Two ways to drive it:

  next_sample(target)   One sample. Used where changes must land on an
                        exact sample (note pitch).

  process(target)       One whole Frame. Used for everything that only
                        changes once per block (bend, mod, X/Y/Z, drift).
*/

#[derive(Debug, Clone)]
pub struct LinearGlide {
    glide_samples: usize,
    current: f32,
    target: f32,
    step: f32,
    remaining: usize,
}

impl LinearGlide {
    pub fn new() -> Self {
        Self {
            glide_samples: 0,
            current: 0.0,
            target: 0.0,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Set the duration of subsequent glides. Negative or NaN times mean no glide.
    pub fn set_glide_time_in_samples(&mut self, samples: f32) {
        self.glide_samples = if samples.is_finite() && samples > 0.0 {
            samples.round() as usize
        } else {
            0
        };
    }

    pub fn glide_time_in_samples(&self) -> usize {
        self.glide_samples
    }

    /// Jump straight to `value` with no glide.
    pub fn set_value(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.remaining = 0;
    }

    pub fn value(&self) -> f32 {
        self.current
    }

    pub fn is_gliding(&self) -> bool {
        self.remaining > 0
    }

    #[inline]
    pub fn next_sample(&mut self, target: f32) -> f32 {
        if target != self.target {
            self.target = target;
            if self.glide_samples == 0 {
                self.current = target;
                self.remaining = 0;
            } else {
                self.step = (target - self.current) / self.glide_samples as f32;
                self.remaining = self.glide_samples;
            }
        }

        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }

        self.current
    }

    pub fn process(&mut self, target: f32) -> Frame {
        if target == self.target && !self.is_gliding() {
            return Frame::splat(self.current);
        }
        Frame::from_fn(|_| self.next_sample(target))
    }
}

impl Default for LinearGlide {
    fn default() -> Self {
        Self::new()
    }
}
