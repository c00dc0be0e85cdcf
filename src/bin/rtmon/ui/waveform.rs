//! Oscilloscope of the device output, titled with how much audio is queued
//! between the render thread and the device.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use rtsignals::FRAME_SIZE;

use super::state::EngineStatus;

/// Quietest full-scale the y axis zooms in to
const MIN_SCALE: f64 = 0.05;

pub fn render_waveform(frame: &mut Frame, area: Rect, samples: &[f32], status: &EngineStatus) {
    // Less than a block queued means the next device callback may underrun
    let starving = status.buffer_capacity > 0 && status.buffered < FRAME_SIZE;
    let buffered_ms = if status.sample_rate > 0.0 {
        status.buffered as f32 * 1000.0 / status.sample_rate
    } else {
        0.0
    };
    let title = format!(
        " Output  {buffered_ms:.1} ms queued ({}/{}) ",
        status.buffered, status.buffer_capacity
    );
    let border = if starving { Color::Red } else { Color::White };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let peak = samples
        .iter()
        .fold(0.0f64, |peak, &s| peak.max(s.abs() as f64));
    let scale = peak.max(MIN_SCALE) * 1.1;

    let last = samples.len().saturating_sub(1).max(1) as f64;
    let data: Vec<(f64, f64)> = samples
        .iter()
        .enumerate()
        .map(|(i, &s)| (i as f64 / last, s as f64))
        .collect();
    let axis = [(0.0, 0.0), (1.0, 0.0)];

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::DarkGray))
            .data(&axis),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(if starving { Color::Yellow } else { Color::Cyan }))
            .data(&data),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(Axis::default().bounds([0.0, 1.0]))
        .y_axis(
            Axis::default()
                .bounds([-scale, scale])
                .labels([format!("{:+.2}", -scale), format!("{:+.2}", scale)])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
