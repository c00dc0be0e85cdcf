//! Bridges arbitrary host buffer sizes to fixed [`FRAME_SIZE`] processing.
//!
//! Audio drivers and plugin hosts hand over buffers of whatever size they
//! like. The processing code wants exactly one [`Frame`] at a time. The
//! adapter keeps one ring per channel on each side:
//!
//! ```text
//! host inputs ─▶ input rings ─▶ Frame chunks ─▶ process ─▶ output rings ─▶ host outputs
//! ```
//!
//! Chunks run until the first output ring can satisfy the host request, so
//! the adapter adds at most one frame of latency.

use crate::{
    buffer::ring::RingBuffer,
    error::{Error, Result},
    frame::Frame,
    FRAME_SIZE,
};

pub struct BlockAdapter {
    input_rings: Vec<RingBuffer>,
    output_rings: Vec<RingBuffer>,
    input_frames: Vec<Frame>,
    output_frames: Vec<Frame>,
    max_frames: usize,
}

impl BlockAdapter {
    /// Allocate rings for `inputs` and `outputs` channels that can serve
    /// host buffers of up to `max_frames` samples.
    pub fn new(inputs: usize, outputs: usize, max_frames: usize) -> Result<Self> {
        let ring_size = max_frames + FRAME_SIZE;
        let input_rings = (0..inputs)
            .map(|_| RingBuffer::with_capacity(ring_size))
            .collect::<Result<Vec<_>>>()?;
        let output_rings = (0..outputs)
            .map(|_| RingBuffer::with_capacity(ring_size))
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "block adapter: {inputs} in, {outputs} out, up to {max_frames} frames per call"
        );

        Ok(Self {
            input_rings,
            output_rings,
            input_frames: vec![Frame::zero(); inputs],
            output_frames: vec![Frame::zero(); outputs],
            max_frames,
        })
    }

    pub fn check_frames(&self, frames: usize) -> Result<()> {
        if frames > self.max_frames {
            return Err(Error::BlockTooLarge {
                frames,
                max: self.max_frames,
            });
        }
        Ok(())
    }

    /// Serve one host callback of `frames` samples per channel.
    ///
    /// `process` is called once per [`FRAME_SIZE`] chunk with that chunk's
    /// input frames, zeroed output frames to fill, and the chunk's start
    /// offset within this host buffer (the value an events-to-signals
    /// engine expects as its block start time). Returns `false` without
    /// touching anything when `frames` exceeds the adapter's maximum or
    /// there are no outputs.
    pub fn process<F>(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        frames: usize,
        mut process: F,
    ) -> bool
    where
        F: FnMut(&[Frame], &mut [Frame], usize),
    {
        if self.output_rings.is_empty() || self.check_frames(frames).is_err() {
            return false;
        }

        for (ring, input) in self.input_rings.iter_mut().zip(inputs) {
            let n = frames.min(input.len());
            ring.write(&input[..n]);
        }

        let mut start_offset = 0;
        while self.output_rings[0].read_available() < frames {
            for (ring, frame) in self.input_rings.iter_mut().zip(&mut self.input_frames) {
                if !ring.read_frame(frame) {
                    frame.fill(0.0);
                }
            }
            for frame in &mut self.output_frames {
                frame.fill(0.0);
            }

            process(&self.input_frames, &mut self.output_frames, start_offset);
            start_offset += FRAME_SIZE;

            for (ring, frame) in self.output_rings.iter_mut().zip(&self.output_frames) {
                ring.write_frame(frame);
            }
        }

        for (ring, output) in self.output_rings.iter_mut().zip(outputs.iter_mut()) {
            let n = frames.min(output.len());
            let read = ring.read(&mut output[..n]);
            output[read..n].fill(0.0);
        }
        true
    }
}
