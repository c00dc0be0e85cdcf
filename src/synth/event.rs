#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What an [`Event`] does. Variant order is the processing order for events
/// landing on the same sample: a note-off scheduled together with a note-on
/// for the same key is handled after it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    NoteOn,
    NoteOff,
    SustainPedal,
    Controller,
    PitchWheel,
    NotePressure,
    ChannelPressure,
    ProgramChange,
}

/// A timestamped performance event, independent of the wire protocol it
/// came from.
///
/// | kind            | value1                     | value2            |
/// |-----------------|----------------------------|-------------------|
/// | NoteOn          | note (semitones, 69 = A4)  | velocity 0..1     |
/// | NoteOff         | note                       | release velocity  |
/// | SustainPedal    | pedal 0..1, down if > 0.5  |                   |
/// | Controller      | controller number          | value 0..1        |
/// | PitchWheel      | bend -1..1                 |                   |
/// | NotePressure    | pressure 0..1              |                   |
/// | ChannelPressure | pressure 0..1              |                   |
/// | ProgramChange   | program number             |                   |
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    /// 1-based channel.
    pub channel: u16,
    /// The physical key or touch that produced the event. 0 = none.
    pub source_index: u16,
    /// Onset in samples from the start of the current host buffer.
    pub time: usize,
    pub value1: f32,
    pub value2: f32,
}

impl Event {
    pub fn new(kind: EventKind, channel: u16, source_index: u16, time: usize) -> Self {
        Self {
            kind,
            channel,
            source_index,
            time,
            value1: 0.0,
            value2: 0.0,
        }
    }

    pub fn note_on(channel: u16, source_index: u16, time: usize, note: f32, velocity: f32) -> Self {
        Self::new(EventKind::NoteOn, channel, source_index, time).with_values(note, velocity)
    }

    pub fn note_off(channel: u16, source_index: u16, time: usize, note: f32) -> Self {
        Self::new(EventKind::NoteOff, channel, source_index, time).with_values(note, 0.0)
    }

    pub fn sustain_pedal(channel: u16, time: usize, value: f32) -> Self {
        Self::new(EventKind::SustainPedal, channel, 0, time).with_values(value, 0.0)
    }

    pub fn controller(channel: u16, time: usize, number: u8, value: f32) -> Self {
        Self::new(EventKind::Controller, channel, 0, time).with_values(number as f32, value)
    }

    pub fn pitch_wheel(channel: u16, time: usize, bend: f32) -> Self {
        Self::new(EventKind::PitchWheel, channel, 0, time).with_values(bend, 0.0)
    }

    pub fn note_pressure(channel: u16, source_index: u16, time: usize, pressure: f32) -> Self {
        Self::new(EventKind::NotePressure, channel, source_index, time).with_values(pressure, 0.0)
    }

    pub fn channel_pressure(channel: u16, time: usize, pressure: f32) -> Self {
        Self::new(EventKind::ChannelPressure, channel, 0, time).with_values(pressure, 0.0)
    }

    pub fn with_values(mut self, value1: f32, value2: f32) -> Self {
        self.value1 = value1;
        self.value2 = value2;
        self
    }

    /// Same event moved to a different onset.
    pub fn at(mut self, time: usize) -> Self {
        self.time = time;
        self
    }

    /// Insertion-order key.
    #[inline]
    pub fn order_key(&self) -> (usize, EventKind) {
        (self.time, self.kind)
    }
}
