//! Benchmarks for engine block processing.
//!
//! An idle engine is the floor; the dense cases add a burst of note,
//! pressure and wheel events to every block.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use rtsignals::{
    synth::{Event, EventsToSignals, Protocol},
    EngineConfig,
};

fn engine(polyphony: usize, protocol: Protocol, unison: bool) -> EventsToSignals {
    let config = EngineConfig::default()
        .with_polyphony(polyphony)
        .with_protocol(protocol)
        .with_unison(unison)
        .with_pitch_glide_seconds(0.05)
        .with_drift_amount(0.5);
    EventsToSignals::from_config(&config).unwrap()
}

fn queue_burst(e: &mut EventsToSignals, block: usize, protocol: Protocol) {
    for i in 0..8usize {
        let note = 48 + ((block * 5 + i * 7) % 36) as u16;
        let time = i * 8;
        let channel = match protocol {
            Protocol::Midi => 1,
            Protocol::Mpe => 2 + (i % 8) as u16,
        };
        e.add_event(Event::note_on(channel, note, time, note as f32, 0.8));
        e.add_event(Event::note_pressure(channel, note, time + 1, 0.5));
        e.add_event(Event::pitch_wheel(channel, time + 2, 0.1));
        e.add_event(Event::note_off(channel, note, time + 4, note as f32));
    }
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("synth/engine");

    for &polyphony in &[1usize, 4, 16] {
        let mut idle = engine(polyphony, Protocol::Midi, false);
        group.bench_with_input(BenchmarkId::new("idle", polyphony), &polyphony, |b, _| {
            b.iter(|| {
                idle.process_vector(black_box(0));
            })
        });

        for (name, protocol, unison) in [
            ("dense_midi", Protocol::Midi, false),
            ("dense_mpe", Protocol::Mpe, false),
            ("dense_unison", Protocol::Midi, true),
        ] {
            let mut e = engine(polyphony, protocol, unison);
            let mut block = 0usize;
            group.bench_with_input(BenchmarkId::new(name, polyphony), &polyphony, |b, _| {
                b.iter(|| {
                    queue_burst(&mut e, block, protocol);
                    e.process_vector(black_box(0));
                    block = block.wrapping_add(1);
                })
            });
        }
    }

    group.finish();
}
