//! Voice table - owner, gate, pitch and age per playable voice

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Row, Table},
    Frame,
};

use rtsignals::io::pitch_to_freq;

use super::state::EngineStatus;

pub fn render_voices(frame: &mut Frame, area: Rect, status: &EngineStatus) {
    let header = Row::new(["voice", "key", "gate", "pitch (oct)", "freq (Hz)", "age (s)"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = status
        .voices
        .iter()
        .take(status.polyphony)
        .enumerate()
        .map(|(i, v)| {
            let index = i + 1;
            let style = if v.key == 0 {
                Style::default().fg(Color::DarkGray)
            } else if index == status.newest_voice {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            let key = if v.key == 0 { "-".to_string() } else { v.key.to_string() };
            Row::new([
                index.to_string(),
                key,
                format!("{:.2}", v.gate),
                format!("{:+.3}", v.pitch),
                format!("{:.1}", pitch_to_freq(v.pitch)),
                format!("{:.2}", v.elapsed),
            ])
            .style(style)
        });

    let widths = [
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Length(6),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(8),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title(" Voices ").borders(Borders::ALL));

    frame.render_widget(table, area);
}
