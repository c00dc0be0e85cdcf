//! TUI module for rtmon
//!
//! Oscilloscope of what the device actually played, plus the engine's voices.

pub mod state;
mod voices;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use std::time::Duration;

use rtsignals::{buffer::RingReader, synth::Event};

use state::{ControlMessage, EngineStatus};
use voices::render_voices;
use waveform::render_waveform;

/// Samples shown in the oscilloscope
const SCOPE_SIZE: usize = 1024;

pub struct UiApp {
    /// Samples the audio callback played
    scope_rx: RingReader,
    status_rx: Consumer<EngineStatus>,
    control_tx: Producer<ControlMessage>,
    /// Performance events from the keyboard (sustain pedal)
    event_tx: Producer<Event>,
    status: EngineStatus,
    scope: Vec<f32>,
    sustain: bool,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        scope_rx: RingReader,
        status_rx: Consumer<EngineStatus>,
        control_tx: Producer<ControlMessage>,
        event_tx: Producer<Event>,
    ) -> Self {
        Self {
            scope_rx,
            status_rx,
            control_tx,
            event_tx,
            status: EngineStatus::default(),
            scope: vec![0.0; SCOPE_SIZE],
            sustain: false,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            // Leaves the last picture in place until enough new audio arrived
            self.scope_rx.peek_most_recent(&mut self.scope);

            while let Ok(status) = self.status_rx.pop() {
                self.status = status;
            }

            terminal.draw(|frame| self.render(frame))?;

            if event::poll(Duration::from_millis(16))? {
                if let TermEvent::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') => {
                self.sustain = !self.sustain;
                let value = if self.sustain { 1.0 } else { 0.0 };
                // events are timed to the start of the next block
                let _ = self.event_tx.push(Event::sustain_pedal(1, 0, value));
            }
            KeyCode::Char('u') => self.send(ControlMessage::ToggleUnison),
            KeyCode::Char('g') => self.send(ControlMessage::ToggleGlide),
            KeyCode::Char('m') => self.send(ControlMessage::ToggleProtocol),
            _ => {}
        }
    }

    fn send(&mut self, msg: ControlMessage) {
        let _ = self.control_tx.push(msg);
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Status bar
                Constraint::Min(8),     // Waveform
                Constraint::Length(self.status.polyphony as u16 + 3), // Voices
                Constraint::Length(1),  // Help bar
            ])
            .split(frame.area());

        self.render_status(frame, chunks[0]);
        render_waveform(frame, chunks[1], &self.scope, &self.status);
        render_voices(frame, chunks[2], &self.status);

        let help = Paragraph::new(" [Q] Quit  [Space] Sustain  [U] Unison  [G] Glide  [M] MIDI/MPE")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let flag = |name: &str, on: bool| {
            Span::styled(
                format!("{name}: {}  ", if on { "on" } else { "off" }),
                Style::default().fg(if on { Color::Green } else { Color::DarkGray }),
            )
        };

        let line = Line::from(vec![
            Span::styled(
                format!(" {}  ", self.status.protocol),
                Style::default().fg(Color::Cyan),
            ),
            flag("unison", self.status.unison),
            flag("glide", self.status.glide),
            flag("sustain", self.status.sustain),
            Span::styled(
                format!("{} voices", self.status.polyphony),
                Style::default().fg(Color::White),
            ),
        ]);

        let block = Block::default().title(" rtmon ").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}
