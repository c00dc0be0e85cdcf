use rtsignals::{
    io::{bytes_to_event, note_to_pitch},
    synth::{Event, EventsToSignals, KeyState, Protocol, VoiceOutput},
    EngineConfig, FRAME_SIZE,
};

// Control glides last 20 ms: 20 samples here, well inside one block.
const SAMPLE_RATE: f32 = 1000.0;

fn engine(polyphony: usize) -> EventsToSignals {
    EventsToSignals::from_config(
        &EngineConfig::default()
            .with_sample_rate(SAMPLE_RATE)
            .with_polyphony(polyphony),
    )
    .unwrap()
}

fn note_on(key: u16, time: usize, velocity: f32) -> Event {
    Event::note_on(1, key, time, key as f32, velocity)
}

fn note_off(key: u16, time: usize) -> Event {
    Event::note_off(1, key, time, key as f32)
}

#[test]
fn note_on_is_sample_accurate() {
    let mut e = engine(4);
    e.add_event(note_on(60, 10, 0.7));
    e.process_vector(0);

    let voice = e.voice(e.newest_voice());
    let gate = voice.output(VoiceOutput::Gate);
    let pitch = voice.output(VoiceOutput::Pitch);
    for t in 0..10 {
        assert_eq!(gate[t], 0.0, "sample {t}");
    }
    for t in 10..FRAME_SIZE {
        assert_eq!(gate[t], 0.7, "sample {t}");
        assert_eq!(pitch[t], note_to_pitch(60.0));
    }
}

#[test]
fn glide_starts_at_the_event_sample() {
    let mut e = engine(1);
    e.set_pitch_glide_in_seconds(0.1);
    e.add_event(note_on(60, 0, 1.0));
    e.process_vector(0);
    e.add_event(note_off(60, 0));
    e.add_event(note_on(72, 32, 1.0));
    e.process_vector(0);

    let pitch = e.voice(1).output(VoiceOutput::Pitch);
    let from = note_to_pitch(60.0);
    let to = note_to_pitch(72.0);
    for t in 0..32 {
        assert_eq!(pitch[t], from);
    }
    assert!(pitch[32] > from && pitch[32] < to);
    assert!(pitch[63] > pitch[32] && pitch[63] < to);
}

#[test]
fn stealing_takes_the_nearest_key() {
    let mut e = engine(3);
    for key in [40, 64, 90] {
        e.add_event(note_on(key, 0, 1.0));
    }
    e.process_vector(0);
    let owners: Vec<usize> = (1..=3).map(|v| e.voice(v).creator_key()).collect();
    assert_eq!(owners, vec![40, 64, 90]);

    e.add_event(note_on(67, 16, 1.0));
    e.process_vector(0);

    assert_eq!(e.voice(1).creator_key(), 40);
    assert_eq!(e.voice(2).creator_key(), 67);
    assert_eq!(e.voice(3).creator_key(), 90);
    assert_eq!(e.newest_voice(), 2);

    // the stolen voice drops its gate for exactly one sample
    let gate = e.voice(2).output(VoiceOutput::Gate);
    assert_eq!(gate[14], 1.0);
    assert_eq!(gate[15], 0.0);
    assert_eq!(gate[16], 1.0);
}

#[test]
fn steal_ties_go_to_the_lowest_voice() {
    let mut e = engine(2);
    e.add_event(note_on(58, 0, 1.0));
    e.add_event(note_on(62, 0, 1.0));
    e.add_event(note_on(60, 1, 1.0));
    e.process_vector(0);

    assert_eq!(e.voice(1).creator_key(), 60);
    assert_eq!(e.voice(2).creator_key(), 62);
}

#[test]
fn sustain_pedal_defers_release() {
    let mut e = engine(2);
    e.add_event(note_on(60, 0, 0.9));
    e.add_event(Event::sustain_pedal(1, 0, 1.0));
    e.process_vector(0);

    e.add_event(note_off(60, 8));
    e.process_vector(0);
    let v = e.newest_voice();
    assert!(e.voice(v).output(VoiceOutput::Gate).iter().all(|&g| g == 0.9));
    assert_eq!(e.key_states().state(60), KeyState::Sustained);
    assert_eq!(e.voice(v).creator_key(), 60);

    e.add_event(Event::sustain_pedal(1, 20, 0.0));
    e.process_vector(0);
    let gate = e.voice(v).output(VoiceOutput::Gate);
    assert_eq!(gate[19], 0.9);
    assert_eq!(gate[20], 0.0);
    assert!(e.voice(v).is_free());
    assert_eq!(e.key_states().state(60), KeyState::Off);
}

#[test]
fn replayed_key_survives_pedal_release() {
    let mut e = engine(2);
    e.add_event(Event::sustain_pedal(1, 0, 1.0));
    e.add_event(note_on(60, 0, 1.0));
    e.add_event(note_off(60, 10));
    e.add_event(note_on(60, 20, 1.0));
    e.add_event(Event::sustain_pedal(1, 30, 0.0));
    e.process_vector(0);

    assert_eq!(e.voice(1).creator_key(), 60);
    assert_eq!(e.voice(1).output(VoiceOutput::Gate).last(), 1.0);
    assert_eq!(e.key_states().state(60), KeyState::On);
}

#[test]
fn mpe_bends_add_up() {
    let mut e = engine(2);
    e.set_protocol(Protocol::Mpe);
    e.add_event(Event::note_on(2, 0, 0, 60.0, 1.0));
    e.add_event(Event::pitch_wheel(1, 0, 0.5));
    e.add_event(Event::pitch_wheel(2, 0, 0.25));
    e.process_vector(0);

    let expected = note_to_pitch(60.0) + 0.5 * 7.0 / 12.0 + 0.25 * 48.0 / 12.0;
    let pitch = e.voice(1).output(VoiceOutput::Pitch).last();
    assert!((pitch - expected).abs() < 1e-4, "{pitch} != {expected}");

    // a second note on its own channel only gets the main channel's bend
    e.add_event(Event::note_on(3, 0, 0, 60.0, 1.0));
    e.process_vector(0);
    let expected = note_to_pitch(60.0) + 0.5 * 7.0 / 12.0;
    let pitch = e.voice(2).output(VoiceOutput::Pitch).last();
    assert!((pitch - expected).abs() < 1e-4, "{pitch} != {expected}");
}

#[test]
fn mpe_main_channel_timbre_reaches_every_voice() {
    let mut e = engine(2);
    e.set_protocol(Protocol::Mpe);
    e.add_event(Event::note_on(2, 0, 0, 60.0, 1.0));
    e.add_event(Event::controller(1, 0, 74, 0.25));
    e.add_event(Event::controller(2, 0, 74, 0.5));
    e.process_vector(0);

    assert!((e.voice(1).output(VoiceOutput::Y).last() - 0.75).abs() < 1e-6);
    assert!((e.voice(2).output(VoiceOutput::Y).last() - 0.25).abs() < 1e-6);
    assert_eq!(e.controller(74).raw_value(), 0.25);
}

#[test]
fn unison_first_note_jumps_then_glides() {
    let mut e = engine(3);
    e.set_unison(true);
    e.set_pitch_glide_in_seconds(0.05);

    e.add_event(note_on(60, 0, 1.0));
    e.process_vector(0);
    let first = note_to_pitch(60.0);
    for v in 1..=3 {
        let pitch = e.voice(v).output(VoiceOutput::Pitch);
        assert_eq!(pitch[0], first, "voice {v}");
        assert_eq!(e.voice(v).creator_key(), 60);
    }

    e.add_event(note_on(64, 0, 1.0));
    e.process_vector(0);
    let second = note_to_pitch(64.0);
    for v in 1..=3 {
        let pitch = e.voice(v).output(VoiceOutput::Pitch);
        assert!(pitch[1] > first && pitch[1] < second, "voice {v}");
        assert!(pitch[30] > pitch[1] && pitch[30] < second, "voice {v}");
        assert!((pitch.last() - second).abs() < 1e-6, "voice {v}");
        assert_eq!(e.voice(v).creator_key(), 64);
    }
}

#[test]
fn unison_release_falls_back_without_retrigger() {
    let mut e = engine(2);
    e.set_unison(true);
    e.add_event(note_on(60, 0, 1.0));
    e.add_event(note_on(67, 4, 1.0));
    e.process_vector(0);

    e.add_event(note_off(67, 10));
    e.process_vector(0);
    for v in 1..=2 {
        let voice = e.voice(v);
        assert_eq!(voice.creator_key(), 60);
        assert!(voice.output(VoiceOutput::Gate).iter().all(|&g| g == 1.0));
        assert_eq!(voice.output(VoiceOutput::Pitch)[10], note_to_pitch(60.0));
    }
}

#[test]
fn events_are_split_across_blocks_of_a_host_buffer() {
    let mut e = engine(2);
    e.add_event(note_on(60, 70, 1.0));
    e.add_event(note_off(60, 150));

    let mut gates = Vec::new();
    for start in (0..256).step_by(FRAME_SIZE) {
        e.process_vector(start);
        gates.extend_from_slice(e.voice(1).output(VoiceOutput::Gate).as_slice());
    }

    assert_eq!(e.pending_events(), 0);
    assert_eq!(gates[69], 0.0);
    assert_eq!(gates[70], 1.0);
    assert_eq!(gates[149], 1.0);
    assert_eq!(gates[150], 0.0);
}

#[test]
fn midi_bytes_drive_the_engine() {
    let mut e = engine(2);
    for (bytes, time) in [
        (&[0x90u8, 60, 127][..], 5),
        (&[0xB0, 64, 127][..], 6),
        (&[0x80, 60, 0][..], 7),
    ] {
        e.add_event(bytes_to_event(bytes, time).unwrap());
    }
    e.process_vector(0);

    let voice = e.voice(1);
    assert_eq!(voice.creator_key(), 61);
    assert_eq!(voice.output(VoiceOutput::Gate)[5], 1.0);
    assert_eq!(voice.output(VoiceOutput::Gate).last(), 1.0);
    assert!(e.sustain_pedal());
    assert_eq!(e.key_states().state(61), KeyState::Sustained);
}

#[test]
fn drift_stays_small() {
    let mut e = EventsToSignals::from_config(
        &EngineConfig::default()
            .with_sample_rate(SAMPLE_RATE)
            .with_polyphony(1)
            .with_drift_amount(1.0),
    )
    .unwrap();
    e.add_event(note_on(69, 0, 1.0));

    // 8 s drift periods at 1 kHz: run for a minute of signal
    for _ in 0..1000 {
        e.process_vector(0);
        for &p in e.voice(1).output(VoiceOutput::Pitch).iter() {
            assert!(p.abs() <= 0.02 + 1e-6);
        }
    }
}
