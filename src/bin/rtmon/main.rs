//! rtmon - terminal monitor for the realtime cores
//!
//! An arpeggiator feeds the events-to-signals engine, a sine per voice turns
//! its pitch and gate rows into sound, and a sample ring carries the result
//! to the audio callback.
//!
//! Run with: cargo run --bin rtmon

mod app;
mod arp;
mod render;
mod ui;

use app::Monitor;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    Monitor::new()
        .bpm(132.0)
        .polyphony(4)
        .buffer_ms(40.0)
        .run()
}
