use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{
    error::{Error, Result},
    frame::Frame,
    FRAME_SIZE,
};

/*
Lock-Free Sample Ring
=====================

A single-producer/single-consumer circular buffer of f32 samples. One thread
writes, one (possibly different) thread reads, and neither ever blocks.

Vocabulary
----------

  capacity      Number of sample slots, always a power of two so that a
                bit mask turns any index into a storage offset.

  write index   Where the producer will put its next sample. Only the
                producer advances it.

  read index    Where the consumer will take its next sample. Only the
                consumer advances it, except when the producer overflows.

  available     write index - read index: samples written but not yet read.


The Doubled Index Space
-----------------------

If both indices wrapped at `capacity`, "empty" and "full" would look the
same (write == read in both cases). So the indices wrap at 2 * capacity
instead:

    capacity = 8, indices live in [0, 16)

    empty:   read = 5, write = 5     available = (5 - 5) & 15 = 0
    full:    read = 5, write = 13    available = (13 - 5) & 15 = 8
    wrapped: read = 14, write = 3    available = (3 - 14) & 15 = 5

Storage offset is `index & (capacity - 1)`; the extra top bit only exists
to tell full from empty.


Publication Order
-----------------

Each side copies its samples first, then publishes its new index with a
release store. The other side loads that index with acquire, so every
sample covered by the index is visible before it is used.

The one cross-write is overflow: when a write would not fit, the producer
pushes the read index forward so the ring ends exactly full. The samples
it skips were never handed to anyone. The consumer publishes with a
compare-exchange against the index it started from, so it never rewinds a
forced advance.

That cross-write means the consumer cannot trust a read index it loaded
before the write index. It loads read, then write, then read again:

    capacity = 8, indices live in [0, 16)

    read  = 5            consumer loads its own index
                         producer overflows: read -> 9, write -> 1
    write = 1            distance(5, 1) = (1 - 5) & 15 = 12 > 8
    read  = 9            changed, so the pair (5, 1) is discarded

A changed read index means an overflow is in flight and the ring is full,
so the consumer reports a full ring and moves no samples this call. A
failed compare-exchange after copying means the producer overwrote part
of what was copied; that read returns 0 as well.

Samples are stored as `AtomicU32` bit patterns. A racing overflow can then
only ever produce stale values, never a data race.


Overlap-Add
-----------

`write_with_overlap_add` accumulates windowed blocks directly in the ring:

    hop = n - overlap

    write #1:   [ w0 w0 w0 w0 ]                  write index += hop
    write #2:         [ w1 w1 w1 w1 ]            write index += hop
                ^^^^^^ complete   ^^^^^^ still accumulating

Each write adds its n samples, zeroes the `hop` samples after them so the
next window starts from silence, and only publishes `hop` samples. The
overlapped tail stays unpublished until the following window has been
added onto it. `read_with_overlap` is the mirror image for analysis: read
n samples, consume only `hop`.
*/

struct RingStorage {
    data: Box<[AtomicU32]>,
    size: usize,
    data_mask: usize,
    distance_mask: usize,
    write_index: AtomicUsize,
    read_index: AtomicUsize,
}

impl RingStorage {
    fn empty() -> Self {
        Self {
            data: Box::new([]),
            size: 0,
            data_mask: 0,
            distance_mask: 0,
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
        }
    }

    fn allocate(samples: usize) -> Result<Self> {
        let requested = samples.max(FRAME_SIZE);
        let size = requested
            .checked_next_power_of_two()
            .ok_or(Error::CapacityOverflow { requested })?;

        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| Error::Allocation { requested: size })?;
        data.resize_with(size, || AtomicU32::new(0));

        Ok(Self {
            data: data.into_boxed_slice(),
            size,
            data_mask: size - 1,
            distance_mask: size * 2 - 1,
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
        })
    }

    #[inline]
    fn advance(&self, index: usize, samples: usize) -> usize {
        index.wrapping_add(samples) & self.distance_mask
    }

    #[inline]
    fn distance(&self, from: usize, to: usize) -> usize {
        to.wrapping_sub(from) & self.distance_mask
    }

    /// Consumer's view: its read index and the samples after it, or `None`
    /// while an overflow is moving the read index.
    fn reader_view(&self) -> Option<(usize, usize)> {
        let read = self.read_index.load(Ordering::Acquire);
        let write = self.write_index.load(Ordering::Acquire);
        if self.read_index.load(Ordering::Acquire) != read {
            return None;
        }
        Some((read, self.distance(read, write).min(self.size)))
    }

    fn read_available(&self) -> usize {
        self.reader_view()
            .map_or(self.size, |(_, available)| available)
    }

    fn write_available(&self) -> usize {
        self.size - self.read_available()
    }

    /// Producer's view. Its own write index cannot move underneath it, and
    /// the read index only ever moves towards it.
    fn writer_read_available(&self) -> usize {
        let write = self.write_index.load(Ordering::Relaxed);
        let read = self.read_index.load(Ordering::Acquire);
        self.distance(read, write).min(self.size)
    }

    fn writer_write_available(&self) -> usize {
        self.size - self.writer_read_available()
    }

    fn store_samples(&self, start: usize, src: &[f32]) {
        for (i, &sample) in src.iter().enumerate() {
            self.data[(start + i) & self.data_mask].store(sample.to_bits(), Ordering::Relaxed);
        }
    }

    fn add_samples(&self, start: usize, src: &[f32]) {
        for (i, &sample) in src.iter().enumerate() {
            let slot = &self.data[(start + i) & self.data_mask];
            let sum = f32::from_bits(slot.load(Ordering::Relaxed)) + sample;
            slot.store(sum.to_bits(), Ordering::Relaxed);
        }
    }

    fn zero_samples(&self, start: usize, count: usize) {
        for i in 0..count {
            self.data[(start + i) & self.data_mask].store(0, Ordering::Relaxed);
        }
    }

    fn load_samples(&self, start: usize, dst: &mut [f32]) {
        for (i, sample) in dst.iter_mut().enumerate() {
            *sample = f32::from_bits(self.data[(start + i) & self.data_mask].load(Ordering::Relaxed));
        }
    }

    /// Publish a new read index unless the writer has forced it past `from`.
    fn publish_read(&self, from: usize, to: usize) -> bool {
        self.read_index
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Push the read index far enough that `new_write` leaves the ring exactly full.
    fn force_reader_forward(&self, new_write: usize) {
        let mut read = self.read_index.load(Ordering::Acquire);
        while self.distance(read, new_write) > self.size {
            let forced = new_write.wrapping_sub(self.size) & self.distance_mask;
            match self.read_index.compare_exchange_weak(
                read,
                forced,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => read = actual,
            }
        }
    }

    fn write(&self, src: &[f32]) {
        if self.size == 0 || src.is_empty() {
            return;
        }

        // Only the newest `size` samples can survive a write this long.
        let src = &src[src.len().saturating_sub(self.size)..];

        let write = self.write_index.load(Ordering::Relaxed);
        let new_write = self.advance(write, src.len());

        self.force_reader_forward(new_write);
        self.store_samples(write, src);
        self.write_index.store(new_write, Ordering::Release);
    }

    fn write_with_overlap_add(&self, src: &[f32], overlap: usize) -> bool {
        let samples = src.len();
        if self.size == 0 || samples == 0 {
            return false;
        }
        let overlap = overlap.min(samples);
        let hop = samples - overlap;

        // No partial windows: the added block plus the zeroed run after it must fit.
        if self.writer_write_available() < samples + hop {
            return false;
        }

        let write = self.write_index.load(Ordering::Relaxed);
        self.add_samples(write, src);
        self.zero_samples(self.advance(write, samples), hop);
        self.write_index
            .store(self.advance(write, hop), Ordering::Release);
        true
    }

    fn read(&self, dst: &mut [f32]) -> usize {
        let Some((read, available)) = self.reader_view() else {
            return 0;
        };
        let samples = dst.len().min(available);

        self.load_samples(read, &mut dst[..samples]);
        if self.publish_read(read, self.advance(read, samples)) {
            samples
        } else {
            0
        }
    }

    fn read_with_overlap(&self, dst: &mut [f32], overlap: usize) -> usize {
        let samples = dst.len();
        let Some((read, available)) = self.reader_view() else {
            return 0;
        };
        if samples == 0 || available < samples {
            return 0;
        }

        let overlap = overlap.min(samples);
        self.load_samples(read, dst);
        if self.publish_read(read, self.advance(read, samples - overlap)) {
            samples
        } else {
            0
        }
    }

    fn peek_most_recent(&self, dst: &mut [f32]) -> usize {
        let samples = dst.len();
        let Some((read, available)) = self.reader_view() else {
            return 0;
        };
        if samples == 0 || available < samples {
            return 0;
        }

        let start = self.advance(read, available - samples);
        self.load_samples(start, dst);
        samples
    }

    fn discard(&self, samples: usize) -> usize {
        let Some((read, available)) = self.reader_view() else {
            return 0;
        };
        let samples = samples.min(available);

        if self.publish_read(read, self.advance(read, samples)) {
            samples
        } else {
            0
        }
    }

    fn clear(&self) {
        let mut read = self.read_index.load(Ordering::Acquire);
        loop {
            let write = self.write_index.load(Ordering::Acquire);
            match self.read_index.compare_exchange_weak(
                read,
                write,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => read = actual,
            }
        }
    }

    fn write_frame(&self, frame: &Frame) -> bool {
        if self.writer_write_available() < FRAME_SIZE {
            return false;
        }
        self.write(frame.as_slice());
        true
    }

    fn read_frame(&self, frame: &mut Frame) -> bool {
        if self.read_available() < FRAME_SIZE {
            return false;
        }
        self.read(frame.as_mut_slice()) == FRAME_SIZE
    }
}

/// Single-owner ring buffer of samples.
///
/// Use it directly when one thread does both sides, or [`split`](Self::split)
/// it into a [`RingWriter`] and a [`RingReader`] for two threads.
pub struct RingBuffer {
    storage: RingStorage,
}

impl RingBuffer {
    /// A ring with no storage. Call [`resize`](Self::resize) before use.
    pub fn new() -> Self {
        Self {
            storage: RingStorage::empty(),
        }
    }

    pub fn with_capacity(samples: usize) -> Result<Self> {
        Ok(Self {
            storage: RingStorage::allocate(samples)?,
        })
    }

    /// Resize to the smallest power of two holding `max(samples, FRAME_SIZE)`
    /// and reset both indices. Returns the new capacity, or 0 if the storage
    /// could not be allocated (the ring is then empty).
    pub fn resize(&mut self, samples: usize) -> usize {
        match self.try_resize(samples) {
            Ok(capacity) => capacity,
            Err(err) => {
                log::warn!("ring buffer resize failed: {err}");
                0
            }
        }
    }

    pub fn try_resize(&mut self, samples: usize) -> Result<usize> {
        self.storage = RingStorage::empty();
        self.storage = RingStorage::allocate(samples)?;
        log::debug!(
            "ring buffer resized to {} samples ({} requested)",
            self.storage.size,
            samples
        );
        Ok(self.storage.size)
    }

    pub fn capacity(&self) -> usize {
        self.storage.size
    }

    pub fn read_available(&self) -> usize {
        self.storage.read_available()
    }

    pub fn write_available(&self) -> usize {
        self.storage.write_available()
    }

    /// Copy `src` in. On overflow the oldest unread samples are dropped so
    /// the ring ends exactly full.
    pub fn write(&mut self, src: &[f32]) {
        self.storage.write(src)
    }

    /// Add `src` at the write position, publish `src.len() - overlap`
    /// samples and zero the run after the block. Skipped (returns `false`)
    /// unless `2 * src.len() - overlap` samples are free.
    ///
    /// The slots being accumulated into must start out zeroed, which holds
    /// for a freshly allocated or resized ring.
    pub fn write_with_overlap_add(&mut self, src: &[f32], overlap: usize) -> bool {
        self.storage.write_with_overlap_add(src, overlap)
    }

    pub fn write_frame(&mut self, frame: &Frame) -> bool {
        self.storage.write_frame(frame)
    }

    /// Copy out up to `dst.len()` samples; returns how many were copied.
    pub fn read(&mut self, dst: &mut [f32]) -> usize {
        self.storage.read(dst)
    }

    /// Read a full `dst.len()` window but consume only `dst.len() - overlap`.
    /// Returns 0 without reading when fewer than `dst.len()` are available.
    pub fn read_with_overlap(&mut self, dst: &mut [f32], overlap: usize) -> usize {
        self.storage.read_with_overlap(dst, overlap)
    }

    pub fn read_frame(&mut self, frame: &mut Frame) -> bool {
        self.storage.read_frame(frame)
    }

    /// Copy the newest `dst.len()` samples without consuming anything.
    pub fn peek_most_recent(&mut self, dst: &mut [f32]) -> usize {
        self.storage.peek_most_recent(dst)
    }

    pub fn discard(&mut self, samples: usize) -> usize {
        self.storage.discard(samples)
    }

    /// Drop everything that has not been read.
    pub fn clear(&mut self) {
        self.storage.clear()
    }

    /// Split into a producer half and a consumer half for two threads.
    pub fn split(self) -> (RingWriter, RingReader) {
        let storage = Arc::new(self.storage);
        (
            RingWriter {
                storage: Arc::clone(&storage),
            },
            RingReader { storage },
        )
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer half of a split [`RingBuffer`].
pub struct RingWriter {
    storage: Arc<RingStorage>,
}

impl RingWriter {
    pub fn capacity(&self) -> usize {
        self.storage.size
    }

    pub fn read_available(&self) -> usize {
        self.storage.writer_read_available()
    }

    pub fn write_available(&self) -> usize {
        self.storage.writer_write_available()
    }

    pub fn write(&mut self, src: &[f32]) {
        self.storage.write(src)
    }

    pub fn write_with_overlap_add(&mut self, src: &[f32], overlap: usize) -> bool {
        self.storage.write_with_overlap_add(src, overlap)
    }

    pub fn write_frame(&mut self, frame: &Frame) -> bool {
        self.storage.write_frame(frame)
    }
}

/// Consumer half of a split [`RingBuffer`].
pub struct RingReader {
    storage: Arc<RingStorage>,
}

impl RingReader {
    pub fn capacity(&self) -> usize {
        self.storage.size
    }

    pub fn read_available(&self) -> usize {
        self.storage.read_available()
    }

    pub fn write_available(&self) -> usize {
        self.storage.write_available()
    }

    pub fn read(&mut self, dst: &mut [f32]) -> usize {
        self.storage.read(dst)
    }

    pub fn read_with_overlap(&mut self, dst: &mut [f32], overlap: usize) -> usize {
        self.storage.read_with_overlap(dst, overlap)
    }

    pub fn read_frame(&mut self, frame: &mut Frame) -> bool {
        self.storage.read_frame(frame)
    }

    pub fn peek_most_recent(&mut self, dst: &mut [f32]) -> usize {
        self.storage.peek_most_recent(dst)
    }

    pub fn discard(&mut self, samples: usize) -> usize {
        self.storage.discard(samples)
    }

    pub fn clear(&mut self) {
        self.storage.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: usize, len: usize) -> Vec<f32> {
        (start..start + len).map(|i| i as f32).collect()
    }

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        let mut ring = RingBuffer::new();
        assert_eq!(ring.resize(197), 256);
        assert_eq!(ring.write_available(), 256);
        assert_eq!(ring.resize(1), FRAME_SIZE);
        assert_eq!(ring.resize(1024), 1024);
    }

    #[test]
    fn impossible_size_reports_zero_capacity() {
        let mut ring = RingBuffer::new();
        assert_eq!(ring.resize(usize::MAX), 0);
        assert_eq!(ring.capacity(), 0);

        ring.write(&[1.0, 2.0]);
        let mut out = [0.0; 2];
        assert_eq!(ring.read(&mut out), 0);
    }

    #[test]
    fn wraps_around_storage_end() {
        let mut ring = RingBuffer::with_capacity(256).unwrap();
        let mut scratch = vec![0.0; 250];
        ring.write(&vec![9.0; 250]);
        ring.read(&mut scratch);

        let input = Frame::from_fn(|i| i as f32);
        assert!(ring.write_frame(&input));
        let mut output = Frame::zero();
        assert!(ring.read_frame(&mut output));
        assert_eq!(ring.read_available(), 0);
        assert_eq!(input, output);
    }

    #[test]
    fn short_read_returns_available_count() {
        let mut ring = RingBuffer::with_capacity(64).unwrap();
        ring.write(&ramp(0, 10));
        let mut out = [0.0; 32];
        assert_eq!(ring.read(&mut out), 10);
        assert_eq!(&out[..10], ramp(0, 10).as_slice());
        assert_eq!(ring.read(&mut out), 0);
    }

    #[test]
    fn overflow_keeps_newest_samples() {
        let mut ring = RingBuffer::with_capacity(64).unwrap();
        ring.write(&ramp(0, 40));
        ring.write(&ramp(40, 40));
        assert_eq!(ring.read_available(), 64);

        let mut out = vec![0.0; 64];
        assert_eq!(ring.read(&mut out), 64);
        assert_eq!(out, ramp(16, 64));
    }

    #[test]
    fn write_longer_than_capacity_keeps_tail() {
        let mut ring = RingBuffer::with_capacity(64).unwrap();
        ring.write(&ramp(0, 200));
        assert_eq!(ring.read_available(), 64);

        let mut out = vec![0.0; 64];
        ring.read(&mut out);
        assert_eq!(out, ramp(136, 64));
    }

    #[test]
    fn peek_returns_newest_without_consuming() {
        let mut ring = RingBuffer::with_capacity(64).unwrap();
        ring.write(&ramp(0, 50));
        let mut out = [0.0; 8];
        assert_eq!(ring.peek_most_recent(&mut out), 8);
        assert_eq!(out.to_vec(), ramp(42, 8));
        assert_eq!(ring.read_available(), 50);

        let mut too_many = [0.0; 51];
        assert_eq!(ring.peek_most_recent(&mut too_many), 0);
    }

    #[test]
    fn discard_and_clear() {
        let mut ring = RingBuffer::with_capacity(64).unwrap();
        ring.write(&ramp(0, 20));
        assert_eq!(ring.discard(5), 5);
        assert_eq!(ring.read_available(), 15);
        assert_eq!(ring.discard(100), 15);

        ring.write(&ramp(0, 20));
        ring.clear();
        assert_eq!(ring.read_available(), 0);
        assert_eq!(ring.write_available(), 64);
    }

    #[test]
    fn overlap_read_rereads_tail() {
        let mut ring = RingBuffer::with_capacity(64).unwrap();
        ring.write(&ramp(0, 12));

        let mut window = [0.0; 8];
        assert_eq!(ring.read_with_overlap(&mut window, 4), 8);
        assert_eq!(window.to_vec(), ramp(0, 8));
        assert_eq!(ring.read_available(), 8);

        assert_eq!(ring.read_with_overlap(&mut window, 4), 8);
        assert_eq!(window.to_vec(), ramp(4, 8));

        // only 4 left: no partial windows
        assert_eq!(ring.read_with_overlap(&mut window, 4), 0);
        assert_eq!(ring.read_available(), 4);
    }

    #[test]
    fn overlap_add_skips_partial_windows() {
        let mut ring = RingBuffer::with_capacity(64).unwrap();
        let window = [1.0; 32];
        // each call needs 2 * 32 - 16 = 48 free samples
        assert!(ring.write_with_overlap_add(&window, 16));
        assert_eq!(ring.read_available(), 16);
        assert!(ring.write_with_overlap_add(&window, 16));
        assert_eq!(ring.read_available(), 32);
        assert!(!ring.write_with_overlap_add(&window, 16));
        assert_eq!(ring.read_available(), 32);
    }
}
