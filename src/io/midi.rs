/// A decoded MIDI 1.0 channel voice message. Channels are 0-based, as on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    PolyPressure { channel: u8, key: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    /// Centred on 0, range -8192..=8191.
    PitchBend { channel: u8, value: i16 },
}

impl MidiEvent {
    /// Decode one message from raw bytes. Running status, system messages
    /// and truncated messages give `None`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        if status & 0x80 == 0 {
            return None;
        }
        let channel = status & 0x0F;
        let data1 = || data.first().map(|b| b & 0x7F);
        let data2 = || data.get(1).map(|b| b & 0x7F);

        let event = match status & 0xF0 {
            0x80 => MidiEvent::NoteOff {
                channel,
                key: data1()?,
                velocity: data2()?,
            },
            0x90 => {
                let key = data1()?;
                match data2()? {
                    0 => MidiEvent::NoteOff {
                        channel,
                        key,
                        velocity: 0,
                    },
                    velocity => MidiEvent::NoteOn {
                        channel,
                        key,
                        velocity,
                    },
                }
            }
            0xA0 => MidiEvent::PolyPressure {
                channel,
                key: data1()?,
                pressure: data2()?,
            },
            0xB0 => MidiEvent::ControlChange {
                channel,
                controller: data1()?,
                value: data2()?,
            },
            0xC0 => MidiEvent::ProgramChange {
                channel,
                program: data1()?,
            },
            0xD0 => MidiEvent::ChannelPressure {
                channel,
                pressure: data1()?,
            },
            0xE0 => {
                let lsb = data1()? as i16;
                let msb = data2()? as i16;
                MidiEvent::PitchBend {
                    channel,
                    value: ((msb << 7) | lsb) - 8192,
                }
            }
            _ => return None,
        };
        Some(event)
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::PolyPressure { channel, .. }
            | MidiEvent::ControlChange { channel, .. }
            | MidiEvent::ProgramChange { channel, .. }
            | MidiEvent::ChannelPressure { channel, .. }
            | MidiEvent::PitchBend { channel, .. } => channel,
        }
    }
}
