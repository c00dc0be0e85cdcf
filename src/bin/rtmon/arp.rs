//! Arpeggiator - a steady source of sample-accurate note events

use rtsignals::{
    synth::{Event, EventsToSignals, Protocol},
    FRAME_SIZE,
};

/// C minor, up and back down
const PATTERN: [f32; 8] = [48.0, 55.0, 60.0, 63.0, 67.0, 70.0, 72.0, 67.0];

/// Notes last one and a half steps so consecutive notes overlap.
const NOTE_LENGTH_STEPS: f64 = 1.5;

const MAX_HELD: usize = 4;

#[derive(Clone, Copy, Debug)]
struct HeldNote {
    channel: u16,
    source: u16,
    note: f32,
    off_at: u64,
}

pub struct Arpeggiator {
    step_samples: u64,
    note_samples: u64,
    position: u64,
    next_step: u64,
    step: usize,
    held: [Option<HeldNote>; MAX_HELD],
}

impl Arpeggiator {
    /// Sixteenth notes at `bpm`
    pub fn new(bpm: f64, sample_rate: f32) -> Self {
        let step_samples = ((sample_rate as f64 * 60.0 / bpm / 4.0) as u64).max(1);
        Self {
            step_samples,
            note_samples: (step_samples as f64 * NOTE_LENGTH_STEPS) as u64,
            position: 0,
            next_step: 0,
            step: 0,
            held: [None; MAX_HELD],
        }
    }

    /// Forget held notes. Call after the engine was cleared.
    pub fn reset(&mut self) {
        self.held = [None; MAX_HELD];
    }

    /// Queue the events falling in the next block. Times are offsets into
    /// that block, to be processed with `process_vector(0)`.
    pub fn tick(&mut self, engine: &mut EventsToSignals) {
        let block_end = self.position + FRAME_SIZE as u64;

        for slot in self.held.iter_mut() {
            if let Some(note) = *slot {
                if note.off_at < block_end {
                    let offset = note.off_at.saturating_sub(self.position) as usize;
                    engine.add_event(Event::note_off(note.channel, note.source, offset, note.note));
                    *slot = None;
                }
            }
        }

        while self.next_step < block_end {
            let offset = (self.next_step - self.position) as usize;
            let note = PATTERN[self.step % PATTERN.len()];

            // MPE gives every note its own channel; MIDI addresses by key
            let (channel, source) = match engine.protocol() {
                Protocol::Midi => (1, note as u16 + 1),
                Protocol::Mpe => (2 + (self.step % engine.polyphony()) as u16, 0),
            };

            if let Some(slot) = self.held.iter_mut().find(|s| s.is_none()) {
                engine.add_event(Event::note_on(channel, source, offset, note, 0.8));
                *slot = Some(HeldNote {
                    channel,
                    source,
                    note,
                    off_at: self.next_step + self.note_samples,
                });
            }

            self.step += 1;
            self.next_step += self.step_samples;
        }

        self.position = block_end;
    }
}
