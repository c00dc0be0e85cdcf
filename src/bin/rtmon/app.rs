//! Monitor - audio setup and thread wiring

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use rtsignals::{buffer::RingBuffer, synth::EventsToSignals, EngineConfig, FRAME_SIZE, MAX_BLOCK_SIZE};

use super::{arp::Arpeggiator, render::Renderer, ui::UiApp};

/// Samples kept for the oscilloscope.
const SCOPE_CAPACITY: usize = 4096;

/// Builder for the monitor application
pub struct Monitor {
    bpm: f64,
    polyphony: usize,
    buffer_ms: f32,
}

impl Monitor {
    pub fn new() -> Self {
        Self {
            bpm: 120.0,
            polyphony: 4,
            buffer_ms: 50.0,
        }
    }

    /// Arpeggiator tempo, sixteenth notes
    pub fn bpm(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    pub fn polyphony(mut self, polyphony: usize) -> Self {
        self.polyphony = polyphony;
        self
    }

    /// Audio buffered between the render thread and the device
    pub fn buffer_ms(mut self, ms: f32) -> Self {
        self.buffer_ms = ms;
        self
    }

    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;

        let engine_config = EngineConfig::default()
            .with_sample_rate(sample_rate)
            .with_polyphony(self.polyphony);
        let engine = EventsToSignals::from_config(&engine_config)
            .wrap_err("failed to set up events-to-signals engine")?;

        // Render thread -> audio callback
        let buffer_samples = ((sample_rate * self.buffer_ms / 1000.0) as usize).max(FRAME_SIZE * 2);
        let (mut audio_tx, mut audio_rx) = RingBuffer::with_capacity(buffer_samples)?.split();
        // Audio callback -> oscilloscope
        let (mut scope_tx, scope_rx) = RingBuffer::with_capacity(SCOPE_CAPACITY)?.split();

        let (control_tx, control_rx) = rtrb::RingBuffer::new(64);
        let (event_tx, event_rx) = rtrb::RingBuffer::new(256);
        let (status_tx, status_rx) = rtrb::RingBuffer::new(16);

        let arp = Arpeggiator::new(self.bpm, sample_rate);
        let mut renderer = Renderer::new(
            engine,
            arp,
            control_rx,
            event_rx,
            status_tx,
            audio_tx.capacity(),
        );

        let quit = Arc::new(AtomicBool::new(false));
        let render_quit = quit.clone();
        let render_thread = thread::Builder::new()
            .name("rtmon-render".into())
            .spawn(move || {
                while !render_quit.load(Ordering::Relaxed) {
                    while audio_tx.write_available() >= FRAME_SIZE {
                        let block = renderer.render_block(audio_tx.read_available());
                        audio_tx.write_frame(&block);
                    }
                    thread::sleep(Duration::from_millis(1));
                }
            })
            .wrap_err("failed to spawn render thread")?;

        let mut mono = vec![0.0f32; MAX_BLOCK_SIZE];
        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                for chunk in data.chunks_mut(MAX_BLOCK_SIZE * channels) {
                    let frames = chunk.len() / channels;
                    let block = &mut mono[..frames];

                    // Underrun: play what arrived, silence for the rest
                    let got = audio_rx.read(block);
                    block[got..].fill(0.0);
                    scope_tx.write(block);

                    for (out, &s) in chunk.chunks_mut(channels).zip(block.iter()) {
                        out.fill(s);
                    }
                }
            },
            |err| eprintln!("Audio error: {}", err),
            None,
        )?;
        stream.play()?;

        let mut terminal = ratatui::init();
        let result = UiApp::new(scope_rx, status_rx, control_tx, event_tx).run(&mut terminal);
        ratatui::restore();

        quit.store(true, Ordering::Relaxed);
        drop(stream);
        render_thread
            .join()
            .map_err(|_| eyre!("render thread panicked"))?;

        result
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}
