use crate::{
    dsp::{drift::Drift, glide::LinearGlide},
    frame::Frame,
    FRAME_SIZE,
};

/// Glide time for bend, mod, X, Y and Z.
pub const CONTROL_GLIDE_SECONDS: f32 = 0.02;
/// Mean time between drift targets, and the glide time towards each.
pub const DRIFT_PERIOD_SECONDS: f32 = 8.0;
/// Full-scale drift in octaves at a drift amount of 1.
pub const DRIFT_SCALE: f32 = 0.02;

/// Rows of a voice's output block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceOutput {
    /// Octaves relative to A4 (440 Hz), including bend and drift.
    Pitch,
    /// Note velocity while the note is on, 0 otherwise.
    Gate,
    /// The voice's own index, constant.
    Voice,
    X,
    Y,
    /// Pressure.
    Z,
    Mod,
    /// Seconds since the voice's last note-on.
    ElapsedTime,
}

pub const NUM_VOICE_OUTPUTS: usize = 8;

impl VoiceOutput {
    pub const ALL: [VoiceOutput; NUM_VOICE_OUTPUTS] = [
        VoiceOutput::Pitch,
        VoiceOutput::Gate,
        VoiceOutput::Voice,
        VoiceOutput::X,
        VoiceOutput::Y,
        VoiceOutput::Z,
        VoiceOutput::Mod,
        VoiceOutput::ElapsedTime,
    ];

    #[inline]
    pub fn row(self) -> usize {
        self as usize
    }
}

/// One voice's performance state and its block of control outputs.
///
/// The engine drives a voice through note transitions during a block.
/// Each transition first writes the *old* pitch, gate and age up to the
/// event's sample, then switches to the new values, so note timing is
/// exact within the block. Pitch glide runs per sample; bend, mod, X, Y, Z
/// and drift are smoothed once per block in [`end_process`](Self::end_process).
pub struct Voice {
    index: usize,
    sample_rate: f32,
    creator_key: usize,
    next_frame: usize,

    current_velocity: f32,
    current_pitch: f32,
    current_pitch_bend: f32,
    current_mod: f32,
    current_x: f32,
    current_y: f32,
    current_z: f32,

    age_in_samples: u32,
    age_step: u32,

    pitch_glide: LinearGlide,
    pitch_bend_glide: LinearGlide,
    mod_glide: LinearGlide,
    x_glide: LinearGlide,
    y_glide: LinearGlide,
    z_glide: LinearGlide,

    drift: Drift,
    drift_amount: f32,

    outputs: [Frame; NUM_VOICE_OUTPUTS],
}

impl Voice {
    pub fn new(index: usize, sample_rate: f32) -> Self {
        let mut voice = Self {
            index,
            sample_rate,
            creator_key: 0,
            next_frame: 0,
            current_velocity: 0.0,
            current_pitch: 0.0,
            current_pitch_bend: 0.0,
            current_mod: 0.0,
            current_x: 0.0,
            current_y: 0.0,
            current_z: 0.0,
            age_in_samples: 0,
            age_step: 0,
            pitch_glide: LinearGlide::new(),
            pitch_bend_glide: LinearGlide::new(),
            mod_glide: LinearGlide::new(),
            x_glide: LinearGlide::new(),
            y_glide: LinearGlide::new(),
            z_glide: LinearGlide::new(),
            drift: Drift::new(Self::drift_seed(index)),
            drift_amount: 0.0,
            outputs: [Frame::zero(); NUM_VOICE_OUTPUTS],
        };
        voice.set_params(0.0, 0.0, sample_rate);
        voice.reset();
        voice
    }

    fn drift_seed(index: usize) -> u64 {
        index as u64 * 232
    }

    pub fn set_params(&mut self, pitch_glide_seconds: f32, drift_amount: f32, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.pitch_glide
            .set_glide_time_in_samples(sample_rate * pitch_glide_seconds);

        let control_glide = sample_rate * CONTROL_GLIDE_SECONDS;
        self.pitch_bend_glide.set_glide_time_in_samples(control_glide);
        self.mod_glide.set_glide_time_in_samples(control_glide);
        self.x_glide.set_glide_time_in_samples(control_glide);
        self.y_glide.set_glide_time_in_samples(control_glide);
        self.z_glide.set_glide_time_in_samples(control_glide);

        self.drift
            .set_period_in_samples(sample_rate * DRIFT_PERIOD_SECONDS);
        self.drift_amount = drift_amount;
    }

    /// Back to silence: no owner, all values zero, drift restarted.
    pub fn reset(&mut self) {
        self.creator_key = 0;
        self.next_frame = 0;
        self.current_velocity = 0.0;
        self.current_pitch = 0.0;
        self.current_pitch_bend = 0.0;
        self.current_mod = 0.0;
        self.current_x = 0.0;
        self.current_y = 0.0;
        self.current_z = 0.0;
        self.age_in_samples = 0;
        self.age_step = 0;

        self.pitch_glide.set_value(0.0);
        self.pitch_bend_glide.set_value(0.0);
        self.mod_glide.set_value(0.0);
        self.x_glide.set_value(0.0);
        self.y_glide.set_value(0.0);
        self.z_glide.set_value(0.0);
        self.drift.reset(Self::drift_seed(self.index));

        for frame in self.outputs.iter_mut() {
            frame.fill(0.0);
        }
        self.outputs[VoiceOutput::Voice.row()].fill(self.index as f32);
    }

    pub fn reset_time(&mut self) {
        self.age_in_samples = 0;
    }

    pub fn begin_process(&mut self) {
        self.next_frame = 0;
    }

    /// Write the current gate, pitch and age up to (not including) `end`.
    fn write_through(&mut self, end: usize) {
        let end = end.min(FRAME_SIZE);
        for t in self.next_frame..end {
            self.write_sample(t, self.current_velocity);
        }
        self.next_frame = self.next_frame.max(end);
    }

    #[inline]
    fn write_sample(&mut self, t: usize, gate: f32) {
        self.outputs[VoiceOutput::Gate.row()][t] = gate;
        self.outputs[VoiceOutput::Pitch.row()][t] = self.pitch_glide.next_sample(self.current_pitch);
        self.age_in_samples = self.age_in_samples.wrapping_add(self.age_step);
        self.outputs[VoiceOutput::ElapsedTime.row()][t] =
            (self.age_in_samples as f64 / self.sample_rate as f64) as f32;
    }

    /// Start a note at sample `time`. With `glide` false the pitch jumps
    /// instead of gliding from the previous note. The first note after a
    /// reset never glides.
    pub fn note_on(&mut self, key: usize, time: usize, pitch: f32, velocity: f32, glide: bool) {
        self.write_through(time);

        if !glide || self.age_step == 0 {
            self.pitch_glide.set_value(pitch);
        }
        self.creator_key = key;
        self.current_pitch = pitch;
        self.current_velocity = velocity;
        self.age_in_samples = 0;
        self.age_step = 1;
    }

    /// Steal this voice for a new note: one sample of gate 0 just before
    /// `time` (at `time` when it is 0), then a fresh note-on.
    pub fn retrigger(&mut self, key: usize, time: usize, pitch: f32, velocity: f32, glide: bool) {
        let time = time.min(FRAME_SIZE - 1);
        let gap = time.saturating_sub(1).max(self.next_frame);

        if gap < FRAME_SIZE {
            self.write_through(gap);
            self.write_sample(gap, 0.0);
            self.next_frame = gap + 1;
        }

        self.note_on(key, gap + 1, pitch, velocity, glide);
    }

    /// Move to a new pitch and owner without a new attack.
    pub fn update_pitch(&mut self, key: usize, time: usize, pitch: f32) {
        self.write_through(time);
        self.creator_key = key;
        self.current_pitch = pitch;
    }

    /// End the note at sample `time`; the voice becomes free.
    pub fn note_off(&mut self, time: usize) {
        self.write_through(time);
        self.creator_key = 0;
        self.current_velocity = 0.0;
    }

    /// Finish the block: write pitch and gate to its end, smooth the block-rate
    /// parameters and add `pitch_bend * bend_semitones` and drift to pitch.
    pub fn end_process(&mut self, bend_semitones: f32) {
        self.write_through(FRAME_SIZE);

        let bend = self.pitch_bend_glide.process(self.current_pitch_bend);
        let drift = self.drift.process();
        self.outputs[VoiceOutput::Mod.row()] = self.mod_glide.process(self.current_mod);
        self.outputs[VoiceOutput::X.row()] = self.x_glide.process(self.current_x);
        self.outputs[VoiceOutput::Y.row()] = self.y_glide.process(self.current_y);
        self.outputs[VoiceOutput::Z.row()] = self.z_glide.process(self.current_z);

        let pitch = &mut self.outputs[VoiceOutput::Pitch.row()];
        *pitch += bend * (bend_semitones / 12.0);
        *pitch += drift * (self.drift_amount * DRIFT_SCALE);
    }

    pub(crate) fn set_pitch_bend(&mut self, bend: f32) {
        self.current_pitch_bend = bend;
    }

    pub(crate) fn set_mod(&mut self, value: f32) {
        self.current_mod = value;
    }

    pub(crate) fn set_x(&mut self, value: f32) {
        self.current_x = value;
    }

    pub(crate) fn set_y(&mut self, value: f32) {
        self.current_y = value;
    }

    pub(crate) fn set_z(&mut self, value: f32) {
        self.current_z = value;
    }

    /// Add another block into one output row (MPE main channel, channel pressure).
    pub(crate) fn add_to_output(&mut self, row: VoiceOutput, frame: &Frame) {
        self.outputs[row.row()] += *frame;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Key or channel that owns the voice. 0 = free.
    pub fn creator_key(&self) -> usize {
        self.creator_key
    }

    pub fn is_free(&self) -> bool {
        self.creator_key == 0
    }

    pub fn velocity(&self) -> f32 {
        self.current_velocity
    }

    /// Target pitch of the current note, before bend and drift.
    pub fn pitch(&self) -> f32 {
        self.current_pitch
    }

    pub fn age_in_samples(&self) -> u32 {
        self.age_in_samples
    }

    pub fn output(&self, row: VoiceOutput) -> &Frame {
        &self.outputs[row.row()]
    }

    pub fn outputs(&self) -> &[Frame; NUM_VOICE_OUTPUTS] {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn gate(voice: &Voice) -> &Frame {
        voice.output(VoiceOutput::Gate)
    }

    #[test]
    fn note_on_lands_on_its_sample() {
        let mut voice = Voice::new(1, SAMPLE_RATE);
        voice.begin_process();
        voice.note_on(60, 10, 0.5, 0.8, true);
        voice.end_process(0.0);

        assert!(gate(&voice)[..10].iter().all(|&g| g == 0.0));
        assert!(gate(&voice)[10..].iter().all(|&g| g == 0.8));
        assert_eq!(voice.output(VoiceOutput::Pitch)[10], 0.5);
        assert_eq!(voice.creator_key(), 60);
    }

    #[test]
    fn retrigger_inserts_single_zero_sample() {
        let mut voice = Voice::new(1, SAMPLE_RATE);
        voice.begin_process();
        voice.note_on(60, 0, 0.0, 1.0, true);
        voice.end_process(0.0);

        voice.begin_process();
        voice.retrigger(62, 20, 0.25, 0.5, true);
        voice.end_process(0.0);

        let g = gate(&voice);
        assert!(g[..19].iter().all(|&x| x == 1.0));
        assert_eq!(g[19], 0.0);
        assert!(g[20..].iter().all(|&x| x == 0.5));
        assert_eq!(voice.creator_key(), 62);
    }

    #[test]
    fn retrigger_at_block_start_uses_first_sample() {
        let mut voice = Voice::new(1, SAMPLE_RATE);
        voice.begin_process();
        voice.note_on(60, 0, 0.0, 1.0, true);
        voice.end_process(0.0);

        voice.begin_process();
        voice.retrigger(61, 0, 0.1, 0.7, true);
        voice.end_process(0.0);

        assert_eq!(gate(&voice)[0], 0.0);
        assert_eq!(gate(&voice)[1], 0.7);
    }

    #[test]
    fn note_off_frees_voice_and_drops_gate() {
        let mut voice = Voice::new(2, SAMPLE_RATE);
        voice.begin_process();
        voice.note_on(60, 0, 0.0, 1.0, true);
        voice.note_off(32);
        voice.end_process(0.0);

        assert!(voice.is_free());
        assert_eq!(gate(&voice)[31], 1.0);
        assert_eq!(gate(&voice)[32], 0.0);
    }

    #[test]
    fn elapsed_time_restarts_at_note_on() {
        let mut voice = Voice::new(1, 1000.0);
        voice.begin_process();
        voice.note_on(60, 0, 0.0, 1.0, true);
        voice.end_process(0.0);

        let elapsed = voice.output(VoiceOutput::ElapsedTime);
        assert!((elapsed[0] - 0.001).abs() < 1e-6);
        assert!((elapsed.last() - 0.064).abs() < 1e-6);
    }

    #[test]
    fn voice_row_holds_index() {
        let voice = Voice::new(5, SAMPLE_RATE);
        assert!(voice.output(VoiceOutput::Voice).iter().all(|&v| v == 5.0));
    }

    #[test]
    fn bend_is_scaled_to_octaves() {
        let mut voice = Voice::new(1, 1000.0);
        voice.set_pitch_bend(1.0);
        // 20 sample control glide at 1 kHz settles within one block
        voice.begin_process();
        voice.end_process(12.0);
        assert!((voice.output(VoiceOutput::Pitch).last() - 1.0).abs() < 1e-6);
    }
}
