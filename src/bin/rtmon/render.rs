//! Render thread state: events in, mono audio blocks out

use rtrb::{Consumer, Producer};
use std::f32::consts::TAU;

use rtsignals::{
    io::pitch_to_freq,
    synth::{EventsToSignals, Event, Protocol, Voice, VoiceOutput},
    Frame, FRAME_SIZE,
};

use super::{
    arp::Arpeggiator,
    ui::state::{ControlMessage, EngineStatus, VoiceStatus},
};

const GLIDE_SECONDS: f32 = 0.08;
const VOICE_LEVEL: f32 = 0.15;
/// One-pole gate smoothing, per sample
const GATE_SMOOTHING: f32 = 0.003;
/// Status goes out every this many blocks
const STATUS_INTERVAL: u32 = 32;

#[derive(Default)]
struct SineVoice {
    phase: f32,
    level: f32,
}

impl SineVoice {
    fn render(&mut self, voice: &Voice, out: &mut Frame, sample_rate: f32) {
        let pitch = voice.output(VoiceOutput::Pitch);
        let gate = voice.output(VoiceOutput::Gate);

        for t in 0..FRAME_SIZE {
            self.level += (gate[t] * VOICE_LEVEL - self.level) * GATE_SMOOTHING;
            self.phase = (self.phase + pitch_to_freq(pitch[t]) / sample_rate).fract();
            out[t] += (self.phase * TAU).sin() * self.level;
        }
    }
}

pub struct Renderer {
    engine: EventsToSignals,
    arp: Arpeggiator,
    oscillators: Vec<SineVoice>,
    control_rx: Consumer<ControlMessage>,
    event_rx: Consumer<Event>,
    status_tx: Producer<EngineStatus>,
    buffer_capacity: usize,
    glide: bool,
    blocks: u32,
}

impl Renderer {
    pub fn new(
        engine: EventsToSignals,
        arp: Arpeggiator,
        control_rx: Consumer<ControlMessage>,
        event_rx: Consumer<Event>,
        status_tx: Producer<EngineStatus>,
        buffer_capacity: usize,
    ) -> Self {
        let oscillators = (0..engine.polyphony()).map(|_| SineVoice::default()).collect();
        Self {
            engine,
            arp,
            oscillators,
            control_rx,
            event_rx,
            status_tx,
            buffer_capacity,
            glide: false,
            blocks: 0,
        }
    }

    /// Render the next block. `buffered` is how much audio is already
    /// queued for the device; it only feeds the status snapshot.
    pub fn render_block(&mut self, buffered: usize) -> Frame {
        while let Ok(msg) = self.control_rx.pop() {
            self.apply(msg);
        }

        self.engine.drain_events(&mut self.event_rx);
        self.arp.tick(&mut self.engine);
        self.engine.process_vector(0);

        let sample_rate = self.engine.sample_rate();
        let mut out = Frame::zero();
        for (voice, osc) in self.engine.voices().iter().zip(self.oscillators.iter_mut()) {
            osc.render(voice, &mut out, sample_rate);
        }

        self.blocks = self.blocks.wrapping_add(1);
        if self.blocks % STATUS_INTERVAL == 0 {
            let status = self.status(buffered);
            // a full status ring just means the UI is behind; skip
            let _ = self.status_tx.push(status);
        }

        out
    }

    fn apply(&mut self, msg: ControlMessage) {
        match msg {
            ControlMessage::ToggleUnison => {
                self.engine.set_unison(!self.engine.unison());
                self.arp.reset();
            }
            ControlMessage::ToggleGlide => {
                self.glide = !self.glide;
                let seconds = if self.glide { GLIDE_SECONDS } else { 0.0 };
                self.engine.set_pitch_glide_in_seconds(seconds);
            }
            ControlMessage::ToggleProtocol => {
                let next = match self.engine.protocol() {
                    Protocol::Midi => Protocol::Mpe,
                    Protocol::Mpe => Protocol::Midi,
                };
                self.engine.set_protocol(next);
                self.arp.reset();
            }
        }
    }

    fn status(&self, buffered: usize) -> EngineStatus {
        let mut status = EngineStatus {
            protocol: self.engine.protocol(),
            unison: self.engine.unison(),
            glide: self.glide,
            sustain: self.engine.sustain_pedal(),
            polyphony: self.engine.polyphony(),
            newest_voice: self.engine.newest_voice(),
            sample_rate: self.engine.sample_rate(),
            buffered,
            buffer_capacity: self.buffer_capacity,
            ..EngineStatus::default()
        };
        for (slot, voice) in status.voices.iter_mut().zip(self.engine.voices()) {
            *slot = VoiceStatus {
                key: voice.creator_key(),
                gate: voice.output(VoiceOutput::Gate).last(),
                pitch: voice.output(VoiceOutput::Pitch).last(),
                elapsed: voice.output(VoiceOutput::ElapsedTime).last(),
            };
        }
        status
    }
}
