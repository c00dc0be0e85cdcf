use crate::{
    config::{validate_sample_rate, EngineConfig},
    error::Result,
    io::converter::note_to_pitch,
    synth::{
        allocator::{find_free_voice, find_nearest_voice},
        controller::{ControllerSmoother, NUM_CONTROLLERS},
        event::{Event, EventKind},
        keys::{KeyState, KeyStateTable, MAX_PHYSICAL_KEYS},
        message::EventSource,
        protocol::Protocol,
        queue::EventQueue,
        voice::{Voice, VoiceOutput, CONTROL_GLIDE_SECONDS},
    },
    FRAME_SIZE,
};

/*
Events To Signals
=================

The engine sits between an event stream (notes, pedals, wheels, knobs) and a
synthesizer's voices. Each block it turns whatever events fell inside that
block into a set of control signals per voice: pitch, gate, X, Y, Z, mod and
time since note-on. The synth reads those signals; it never sees an event.

Vocabulary
----------

  key           Who owns a note. In MIDI mode that's the event's source
                index (the physical key); in MPE mode it's the channel,
                since every MPE note gets a channel of its own.

  voice 0       The MPE main channel. Never plays a note. Its bend, X, Y, Z
                and mod are added to every playable voice.

  playable      Voices 1..=polyphony.

  unison        Every playable voice follows the same key. The newest held
                key wins; releasing it falls back to the next newest.

  sustain       Pedal down: releasing a key leaves its voice sounding until
                the pedal comes up.


A Block
-------

  process_vector(block_start)
        │
        ├── begin_process on every voice
        │
        ├── events with time < block_start + FRAME_SIZE, in (time, kind)
        │   order, each at offset time - block_start
        │     NoteOn ─── allocate / retrigger / unison
        │     NoteOff ── release or sustain
        │     ...
        │
        ├── controllers and channel pressure step one block
        │
        └── end_process on every voice, then MPE main channel or
            MIDI channel pressure mixed in

Nothing here allocates. Every table is sized for MAX_VOICES and
MAX_PHYSICAL_KEYS when the engine is built.
*/

pub const MAX_VOICES: usize = 16;
pub const MAX_EVENTS_PER_BLOCK: usize = 128;

const MPE_MAIN_CHANNEL: u16 = 1;
const MAIN_VOICE: usize = 0;

const CC_MOD: usize = 1;
const CC_X: usize = 73;
const CC_Y: usize = 74;
const CC_ALL_SOUND_OFF: usize = 120;
const CC_ALL_NOTES_OFF: usize = 123;

/// Last known continuous values for one channel (or, in MIDI mode, for
/// everything). Copied into a voice when it starts a note.
#[derive(Debug, Clone, Copy, Default)]
struct Expression {
    bend: f32,
    mod_value: f32,
    x: f32,
    y: f32,
    z: f32,
}

impl Expression {
    fn apply_to(&self, voice: &mut Voice) {
        voice.set_pitch_bend(self.bend);
        voice.set_mod(self.mod_value);
        voice.set_x(self.x);
        voice.set_y(self.y);
        voice.set_z(self.z);
    }
}

/// Turns timestamped [`Event`]s into per-voice control signals, one
/// [`FRAME_SIZE`] block at a time.
pub struct EventsToSignals {
    sample_rate: f32,
    polyphony: usize,
    protocol: Protocol,
    unison: bool,
    sustain_pedal: bool,

    pitch_glide_seconds: f32,
    drift_amount: f32,
    pitch_bend_semitones: f32,
    mpe_pitch_bend_semitones: f32,

    voices: Vec<Voice>,
    controllers: Vec<ControllerSmoother>,
    channel_pressure: ControllerSmoother,
    queue: EventQueue,
    keys: KeyStateTable,

    shared_expression: Expression,
    channel_expression: [Expression; MAX_PHYSICAL_KEYS + 1],

    last_free_voice: usize,
    newest_voice: usize,
}

impl EventsToSignals {
    pub fn new(sample_rate: f32) -> Result<Self> {
        Self::from_config(&EngineConfig::default().with_sample_rate(sample_rate))
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut engine = Self {
            sample_rate: config.sample_rate,
            polyphony: config.effective_polyphony(),
            protocol: config.protocol,
            unison: config.unison,
            sustain_pedal: false,
            pitch_glide_seconds: config.pitch_glide_seconds,
            drift_amount: config.drift_amount,
            pitch_bend_semitones: config.pitch_bend_semitones,
            mpe_pitch_bend_semitones: config.mpe_pitch_bend_semitones,
            voices: (0..=MAX_VOICES)
                .map(|i| Voice::new(i, config.sample_rate))
                .collect(),
            controllers: (0..NUM_CONTROLLERS).map(|_| ControllerSmoother::new()).collect(),
            channel_pressure: ControllerSmoother::new(),
            queue: EventQueue::with_capacity(MAX_EVENTS_PER_BLOCK),
            keys: KeyStateTable::new(),
            shared_expression: Expression::default(),
            channel_expression: [Expression::default(); MAX_PHYSICAL_KEYS + 1],
            last_free_voice: 0,
            newest_voice: 0,
        };
        engine.update_params();
        engine.clear();

        log::debug!(
            "events-to-signals: {} Hz, {} voices, {}",
            engine.sample_rate,
            engine.polyphony,
            engine.protocol
        );
        Ok(engine)
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) -> Result<()> {
        validate_sample_rate(sample_rate)?;
        self.sample_rate = sample_rate;
        self.update_params();
        log::debug!("events-to-signals: sample rate {sample_rate} Hz");
        Ok(())
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Clamp to `1..=MAX_VOICES`, silence every voice and return the
    /// polyphony in effect.
    pub fn set_polyphony(&mut self, polyphony: usize) -> usize {
        let clamped = polyphony.clamp(1, MAX_VOICES);
        if clamped != polyphony {
            log::warn!("polyphony {polyphony} out of range, using {clamped}");
        }
        self.polyphony = clamped;
        self.clear();
        log::debug!("events-to-signals: {clamped} voices");
        clamped
    }

    pub fn polyphony(&self) -> usize {
        self.polyphony
    }

    pub fn set_protocol(&mut self, protocol: Protocol) {
        if protocol != self.protocol {
            self.protocol = protocol;
            self.clear();
        }
    }

    /// Select the protocol by name ("MIDI" or "MPE"). Anything else falls
    /// back to MIDI.
    pub fn set_protocol_name(&mut self, name: &str) {
        let protocol = name.parse::<Protocol>().unwrap_or_else(|err| {
            log::warn!("{err}, falling back to MIDI");
            Protocol::Midi
        });
        self.set_protocol(protocol);
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn set_unison(&mut self, unison: bool) {
        if unison != self.unison {
            self.unison = unison;
            self.clear();
        }
    }

    pub fn unison(&self) -> bool {
        self.unison
    }

    pub fn set_pitch_glide_in_seconds(&mut self, seconds: f32) {
        self.pitch_glide_seconds = seconds;
        self.update_params();
    }

    pub fn set_drift_amount(&mut self, amount: f32) {
        self.drift_amount = amount;
        self.update_params();
    }

    pub fn set_pitch_bend_in_semitones(&mut self, semitones: f32) {
        self.pitch_bend_semitones = semitones;
    }

    pub fn set_mpe_pitch_bend_in_semitones(&mut self, semitones: f32) {
        self.mpe_pitch_bend_semitones = semitones;
    }

    fn update_params(&mut self) {
        let sample_rate = self.sample_rate;
        for voice in self.voices.iter_mut() {
            if voice.index() == MAIN_VOICE {
                voice.set_params(0.0, 0.0, sample_rate);
            } else {
                voice.set_params(self.pitch_glide_seconds, self.drift_amount, sample_rate);
            }
        }
        let control_glide = sample_rate * CONTROL_GLIDE_SECONDS;
        for cc in self.controllers.iter_mut() {
            cc.set_glide_time_in_samples(control_glide);
        }
        self.channel_pressure.set_glide_time_in_samples(control_glide);
    }

    /// Queue an event for a coming block. Returns `false` if the queue is
    /// full and the event was dropped.
    pub fn add_event(&mut self, event: Event) -> bool {
        self.queue.insert(event)
    }

    /// Move everything waiting in `source` into the queue. Returns how many
    /// events were accepted.
    pub fn drain_events<S: EventSource + ?Sized>(&mut self, source: &mut S) -> usize {
        let mut accepted = 0;
        while let Some(event) = source.pop() {
            if self.add_event(event) {
                accepted += 1;
            }
        }
        accepted
    }

    pub fn clear_events(&mut self) {
        self.queue.clear();
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Run one block starting `block_start` samples into the host buffer.
    pub fn process_vector(&mut self, block_start: usize) {
        let block_end = block_start + FRAME_SIZE;
        let active = self.polyphony + 1;

        for voice in self.voices[..active].iter_mut() {
            voice.begin_process();
        }

        let count = self.queue.count_before(block_end);
        for i in 0..count {
            if let Some(&event) = self.queue.get(i) {
                let offset = event.time.saturating_sub(block_start).min(FRAME_SIZE - 1);
                self.process_event(&event, offset);
            }
        }
        self.queue.consume(count);

        for cc in self.controllers.iter_mut() {
            cc.process();
        }
        self.channel_pressure.process();

        let (main, playable) = self.voices[..active].split_at_mut(1);
        let main = &mut main[MAIN_VOICE];
        main.end_process(self.pitch_bend_semitones);

        match self.protocol {
            Protocol::Midi => {
                let pressure = self.channel_pressure.output();
                for voice in playable.iter_mut() {
                    voice.end_process(self.pitch_bend_semitones);
                    voice.add_to_output(VoiceOutput::Z, pressure);
                }
            }
            Protocol::Mpe => {
                for voice in playable.iter_mut() {
                    voice.end_process(self.mpe_pitch_bend_semitones);
                    for row in [
                        VoiceOutput::Pitch,
                        VoiceOutput::X,
                        VoiceOutput::Y,
                        VoiceOutput::Z,
                        VoiceOutput::Mod,
                    ] {
                        voice.add_to_output(row, main.output(row));
                    }
                }
            }
        }
    }

    fn process_event(&mut self, event: &Event, time: usize) {
        match event.kind {
            EventKind::NoteOn => self.process_note_on(event, time),
            EventKind::NoteOff => self.process_note_off(event, time),
            EventKind::SustainPedal => self.process_sustain(event, time),
            EventKind::Controller => self.process_controller(event, time),
            EventKind::PitchWheel => self.process_pitch_wheel(event),
            EventKind::NotePressure => self.process_note_pressure(event),
            EventKind::ChannelPressure => self.process_channel_pressure(event),
            EventKind::ProgramChange => {}
        }
    }

    /// Key that owns the event's note: the source index in MIDI mode, the
    /// channel in MPE mode.
    fn key_for(&self, event: &Event) -> usize {
        let key = match self.protocol {
            Protocol::Midi => event.source_index,
            Protocol::Mpe => event.channel,
        };
        KeyStateTable::clamp_key(key as usize)
    }

    fn is_main_channel(&self, event: &Event) -> bool {
        self.protocol == Protocol::Mpe && event.channel <= MPE_MAIN_CHANNEL
    }

    fn expression_for(&self, key: usize) -> Expression {
        match self.protocol {
            Protocol::Midi => Expression {
                // note pressure starts fresh with every note
                z: 0.0,
                ..self.shared_expression
            },
            Protocol::Mpe => self.channel_expression[key],
        }
    }

    fn playable(&mut self) -> &mut [Voice] {
        &mut self.voices[1..=self.polyphony]
    }

    fn process_note_on(&mut self, event: &Event, time: usize) {
        if self.is_main_channel(event) {
            return;
        }
        let key = self.key_for(event);
        let pitch = note_to_pitch(event.value1);
        let velocity = event.value2;
        let expression = self.expression_for(key);

        if self.unison {
            self.unison_note_on(key, time, pitch, velocity, expression);
            return;
        }

        self.keys.note_on(key, pitch, velocity);

        let owned = self
            .playable()
            .iter()
            .position(|v| v.creator_key() == key)
            .map(|i| i + 1);

        let (index, retrigger) = match owned {
            Some(v) => (v, true),
            None => match find_free_voice(&self.voices, self.polyphony, &mut self.last_free_voice) {
                Some(v) => (v, false),
                None => match find_nearest_voice(&self.voices, self.polyphony, key) {
                    Some(v) => (v, true),
                    None => return,
                },
            },
        };

        let voice = &mut self.voices[index];
        expression.apply_to(voice);
        if retrigger {
            voice.retrigger(key, time, pitch, velocity, true);
        } else {
            voice.note_on(key, time, pitch, velocity, true);
        }
        self.newest_voice = index;
    }

    fn unison_note_on(
        &mut self,
        key: usize,
        time: usize,
        pitch: f32,
        velocity: f32,
        expression: Expression,
    ) {
        // the first note of a gesture jumps; later ones glide from it
        let glide = self.keys.held_count() > 0;
        self.keys.note_on(key, pitch, velocity);

        for voice in self.playable() {
            expression.apply_to(voice);
            if voice.is_free() {
                voice.note_on(key, time, pitch, velocity, glide);
            } else {
                voice.retrigger(key, time, pitch, velocity, glide);
            }
        }
        self.newest_voice = 1;
    }

    fn process_note_off(&mut self, event: &Event, time: usize) {
        if self.is_main_channel(event) {
            return;
        }
        let key = self.key_for(event);
        if self.keys.state(key) != KeyState::On {
            return;
        }
        let state = self.keys.release(key, self.sustain_pedal);

        if self.unison {
            self.unison_note_off(key, time, state);
            return;
        }

        if state != KeyState::Off {
            return;
        }
        let released = self
            .playable()
            .iter()
            .position(|v| v.creator_key() == key)
            .map(|i| i + 1);
        if let Some(index) = released {
            if !self.restore_stolen_note(index, time) {
                self.voices[index].note_off(time);
            }
        }
    }

    /// Hand a just-released voice to the newest held key that lost its voice
    /// to stealing. The restored note starts one sample after the release.
    fn restore_stolen_note(&mut self, index: usize, time: usize) -> bool {
        let playable = &self.voices[1..=self.polyphony];
        let stolen = self
            .keys
            .most_recent_held_where(|k| playable.iter().all(|v| v.creator_key() != k));
        let Some(key) = stolen else {
            return false;
        };

        let entry = *self.keys.get(key);
        let expression = self.expression_for(key);
        let voice = &mut self.voices[index];
        expression.apply_to(voice);
        voice.retrigger(key, time + 1, entry.pitch, entry.velocity, true);
        self.newest_voice = index;
        true
    }

    fn unison_note_off(&mut self, key: usize, time: usize, state: KeyState) {
        let sounding = self.voices[1].creator_key() == key;
        if !sounding {
            return;
        }

        match self.keys.most_recent_held(key) {
            Some(next) => {
                let pitch = self.keys.get(next).pitch;
                for voice in self.playable() {
                    voice.update_pitch(next, time, pitch);
                }
            }
            None if state == KeyState::Off => {
                for voice in self.playable() {
                    voice.note_off(time);
                }
            }
            // sustained: the pedal release turns them off
            None => {}
        }
    }

    fn process_sustain(&mut self, event: &Event, time: usize) {
        self.sustain_pedal = event.value1 > 0.5;
        if self.sustain_pedal {
            return;
        }

        let keys = &self.keys;
        let polyphony = self.polyphony;
        for voice in self.voices[1..=polyphony].iter_mut() {
            if !voice.is_free() && keys.state(voice.creator_key()) == KeyState::Sustained {
                voice.note_off(time);
            }
        }
        self.keys.release_sustained();
    }

    fn process_controller(&mut self, event: &Event, time: usize) {
        let number = (event.value1.max(0.0) as usize).min(NUM_CONTROLLERS - 1);
        let value = event.value2;

        if self.protocol == Protocol::Mpe && !self.is_main_channel(event) {
            let key = self.key_for(event);
            let expression = &mut self.channel_expression[key];
            match number {
                CC_MOD => expression.mod_value = value,
                CC_X => expression.x = value,
                CC_Y => expression.y = value,
                _ => return,
            }
            let expression = *expression;
            self.for_each_owned(key, |v| expression.apply_to(v));
            return;
        }

        self.controllers[number].set_raw_value(value);

        match number {
            CC_ALL_SOUND_OFF if value == 0.0 => self.all_sound_off(),
            CC_ALL_NOTES_OFF if value == 0.0 => self.all_notes_off(time),
            CC_MOD | CC_X | CC_Y => {
                let expression = match self.protocol {
                    Protocol::Midi => &mut self.shared_expression,
                    Protocol::Mpe => &mut self.channel_expression[MPE_MAIN_CHANNEL as usize],
                };
                match number {
                    CC_MOD => expression.mod_value = value,
                    CC_X => expression.x = value,
                    _ => expression.y = value,
                }
                match self.protocol {
                    Protocol::Midi => {
                        for voice in self.voices[1..=self.polyphony].iter_mut() {
                            match number {
                                CC_MOD => voice.set_mod(value),
                                CC_X => voice.set_x(value),
                                _ => voice.set_y(value),
                            }
                        }
                    }
                    Protocol::Mpe => {
                        let main = &mut self.voices[MAIN_VOICE];
                        match number {
                            CC_MOD => main.set_mod(value),
                            CC_X => main.set_x(value),
                            _ => main.set_y(value),
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn process_pitch_wheel(&mut self, event: &Event) {
        let bend = event.value1;
        match self.protocol {
            Protocol::Midi => {
                self.shared_expression.bend = bend;
                for voice in self.playable() {
                    voice.set_pitch_bend(bend);
                }
            }
            Protocol::Mpe if self.is_main_channel(event) => {
                self.channel_expression[MPE_MAIN_CHANNEL as usize].bend = bend;
                self.voices[MAIN_VOICE].set_pitch_bend(bend);
            }
            Protocol::Mpe => {
                let key = self.key_for(event);
                self.channel_expression[key].bend = bend;
                self.for_each_owned(key, |v| v.set_pitch_bend(bend));
            }
        }
    }

    fn process_note_pressure(&mut self, event: &Event) {
        // MPE sends pressure as channel pressure on the note's own channel
        if self.protocol == Protocol::Mpe {
            return;
        }
        let key = self.key_for(event);
        let pressure = event.value1;
        self.for_each_owned(key, |v| v.set_z(pressure));
    }

    fn process_channel_pressure(&mut self, event: &Event) {
        let pressure = event.value1;
        match self.protocol {
            Protocol::Midi => self.channel_pressure.set_raw_value(pressure),
            Protocol::Mpe if self.is_main_channel(event) => {
                self.channel_expression[MPE_MAIN_CHANNEL as usize].z = pressure;
                self.voices[MAIN_VOICE].set_z(pressure);
            }
            Protocol::Mpe => {
                let key = self.key_for(event);
                self.channel_expression[key].z = pressure;
                self.for_each_owned(key, |v| v.set_z(pressure));
            }
        }
    }

    fn for_each_owned(&mut self, key: usize, mut f: impl FnMut(&mut Voice)) {
        for voice in self.playable() {
            if voice.creator_key() == key {
                f(voice);
            }
        }
    }

    fn all_notes_off(&mut self, time: usize) {
        for voice in self.playable() {
            if !voice.is_free() {
                voice.note_off(time);
            }
        }
        self.keys.clear();
    }

    fn all_sound_off(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.reset();
        }
        self.keys.clear();
        self.sustain_pedal = false;
    }

    /// Silence everything: voices, keys, pedal, controllers and remembered
    /// expression. Queued events are kept.
    pub fn clear(&mut self) {
        self.all_sound_off();
        for cc in self.controllers.iter_mut() {
            cc.reset();
        }
        self.channel_pressure.reset();
        self.shared_expression = Expression::default();
        self.channel_expression = [Expression::default(); MAX_PHYSICAL_KEYS + 1];
        self.last_free_voice = 0;
        self.newest_voice = 0;
    }

    /// Restart every voice's elapsed-time counter.
    pub fn reset_times(&mut self) {
        for voice in self.voices.iter_mut() {
            voice.reset_time();
        }
    }

    /// Voice `n`; 0 is the MPE main channel. Out-of-range indices clamp to
    /// the last voice.
    pub fn voice(&self, n: usize) -> &Voice {
        &self.voices[n.min(MAX_VOICES)]
    }

    /// Playable voices, `1..=polyphony`.
    pub fn voices(&self) -> &[Voice] {
        &self.voices[1..=self.polyphony]
    }

    /// Smoothed controller `n`, clamped to `0..NUM_CONTROLLERS`.
    pub fn controller(&self, n: usize) -> &ControllerSmoother {
        &self.controllers[n.min(NUM_CONTROLLERS - 1)]
    }

    /// Index of the voice that most recently started a note.
    pub fn newest_voice(&self) -> usize {
        self.newest_voice
    }

    pub fn key_states(&self) -> &KeyStateTable {
        &self.keys
    }

    pub fn sustain_pedal(&self) -> bool {
        self.sustain_pedal
    }
}
