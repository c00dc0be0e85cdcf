use crate::{
    io::midi::MidiEvent,
    synth::event::{Event, EventKind},
};

const CC_SUSTAIN: u8 = 64;

/// Translate a decoded MIDI message into an engine [`Event`] at `time`
/// samples into the host buffer.
///
/// Channels become 1-based. In MIDI addressing the source index is
/// `key + 1`, so that 0 can keep meaning "no key". Controller 64 becomes a
/// sustain pedal event; program changes are passed through.
pub fn midi_to_event(midi: MidiEvent, time: usize) -> Event {
    let channel = midi.channel() as u16 + 1;
    match midi {
        MidiEvent::NoteOn { key, velocity, .. } => Event::note_on(
            channel,
            key as u16 + 1,
            time,
            key as f32,
            normalize(velocity),
        ),
        MidiEvent::NoteOff { key, velocity, .. } => {
            Event::new(EventKind::NoteOff, channel, key as u16 + 1, time)
                .with_values(key as f32, normalize(velocity))
        }
        MidiEvent::PolyPressure { key, pressure, .. } => {
            Event::note_pressure(channel, key as u16 + 1, time, normalize(pressure))
        }
        MidiEvent::ControlChange {
            controller: CC_SUSTAIN,
            value,
            ..
        } => Event::sustain_pedal(channel, time, normalize(value)),
        MidiEvent::ControlChange {
            controller, value, ..
        } => Event::controller(channel, time, controller, normalize(value)),
        MidiEvent::ProgramChange { program, .. } => {
            Event::new(EventKind::ProgramChange, channel, 0, time)
                .with_values(program as f32, 0.0)
        }
        MidiEvent::ChannelPressure { pressure, .. } => {
            Event::channel_pressure(channel, time, normalize(pressure))
        }
        MidiEvent::PitchBend { value, .. } => {
            Event::pitch_wheel(channel, time, (value as f32 / 8192.0).clamp(-1.0, 1.0))
        }
    }
}

/// Decode raw bytes straight to an [`Event`].
pub fn bytes_to_event(bytes: &[u8], time: usize) -> Option<Event> {
    MidiEvent::parse(bytes).map(|midi| midi_to_event(midi, time))
}

#[inline]
fn normalize(value: u8) -> f32 {
    value as f32 / 127.0
}

/// Note number (fractional semitones, 69 = A4) to pitch in octaves
/// relative to A4.
#[inline]
pub fn note_to_pitch(note: f32) -> f32 {
    (note - 69.0) / 12.0
}

/// Pitch in octaves relative to A4 to frequency in Hz.
#[inline]
pub fn pitch_to_freq(pitch: f32) -> f32 {
    440.0 * pitch.exp2()
}

pub fn midi_note_to_freq(note: u8) -> f32 {
    pitch_to_freq(note_to_pitch(note as f32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_is_one_based() {
        let event = midi_to_event(
            MidiEvent::NoteOn {
                channel: 0,
                key: 60,
                velocity: 127,
            },
            12,
        );
        assert_eq!(event.kind, EventKind::NoteOn);
        assert_eq!(event.channel, 1);
        assert_eq!(event.source_index, 61);
        assert_eq!(event.time, 12);
        assert_eq!(event.value1, 60.0);
        assert_eq!(event.value2, 1.0);
    }

    #[test]
    fn cc64_is_sustain_pedal() {
        let event = bytes_to_event(&[0xB0, 64, 127], 0).unwrap();
        assert_eq!(event.kind, EventKind::SustainPedal);
        assert!(event.value1 > 0.5);

        let event = bytes_to_event(&[0xB0, 74, 0], 0).unwrap();
        assert_eq!(event.kind, EventKind::Controller);
        assert_eq!(event.value1, 74.0);
    }

    #[test]
    fn zero_velocity_note_on_becomes_note_off() {
        let event = bytes_to_event(&[0x90, 64, 0], 3).unwrap();
        assert_eq!(event.kind, EventKind::NoteOff);
        assert_eq!(event.source_index, 65);
    }

    #[test]
    fn bend_is_normalized() {
        let event = bytes_to_event(&[0xE0, 0x00, 0x00], 0).unwrap();
        assert_eq!(event.value1, -1.0);
    }

    #[test]
    fn pitch_units() {
        assert_eq!(note_to_pitch(69.0), 0.0);
        assert_eq!(note_to_pitch(81.0), 1.0);
        assert!((midi_note_to_freq(69) - 440.0).abs() < 1e-3);
        assert!((pitch_to_freq(-1.0) - 220.0).abs() < 1e-3);
    }
}
