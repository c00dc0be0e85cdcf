// Purpose - getting events in from the outside world

pub mod converter;
pub mod midi;

pub use converter::{bytes_to_event, midi_to_event, note_to_pitch, pitch_to_freq};
pub use midi::MidiEvent;
