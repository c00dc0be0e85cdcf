//! Fixed-size sample blocks.
//!
//! A `Frame` is the unit of work on the real-time path: exactly
//! [`FRAME_SIZE`] samples, stored inline so frames can live inside voice
//! structs without touching the heap.

use std::ops::{Add, AddAssign, Deref, DerefMut, Mul, MulAssign};

use crate::FRAME_SIZE;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame([f32; FRAME_SIZE]);

impl Frame {
    pub const fn splat(value: f32) -> Self {
        Self([value; FRAME_SIZE])
    }

    pub const fn zero() -> Self {
        Self::splat(0.0)
    }

    pub fn from_fn(f: impl FnMut(usize) -> f32) -> Self {
        Self(std::array::from_fn(f))
    }

    /// Copy the first `FRAME_SIZE` samples of `src`. Missing samples are zero.
    pub fn from_slice(src: &[f32]) -> Self {
        let mut frame = Self::zero();
        let n = src.len().min(FRAME_SIZE);
        frame.0[..n].copy_from_slice(&src[..n]);
        frame
    }

    pub fn fill(&mut self, value: f32) {
        self.0.fill(value);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.0
    }

    /// Last sample of the block.
    pub fn last(&self) -> f32 {
        self.0[FRAME_SIZE - 1]
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::zero()
    }
}

impl Deref for Frame {
    type Target = [f32; FRAME_SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Frame {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl AddAssign for Frame {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0.iter()) {
            *a += b;
        }
    }
}

impl Add for Frame {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl MulAssign<f32> for Frame {
    fn mul_assign(&mut self, rhs: f32) {
        for a in self.0.iter_mut() {
            *a *= rhs;
        }
    }
}

impl Mul<f32> for Frame {
    type Output = Self;

    fn mul(mut self, rhs: f32) -> Self {
        self *= rhs;
        self
    }
}
