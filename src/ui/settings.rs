//! Settings overlay.
//!
//! Threshold adjustment with the valid range, the preset values and the
//! current theme.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::common::centered_rect;
use crate::app::{App, THRESHOLD_STEP};
use crate::sensor::Threshold;

/// Width of the threshold slider track in cells.
const SLIDER_WIDTH: usize = 30;

/// Render the settings overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let threshold = app.threshold();
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let presets: Vec<Span> = Threshold::PRESETS
        .iter()
        .enumerate()
        .flat_map(|(i, preset)| {
            let style = if *preset == threshold {
                app.theme.header.add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            [
                Span::styled(format!(" {}:{} ", i + 1, preset.ppm()), style),
                Span::raw(" "),
            ]
        })
        .collect();

    let mut preset_line = vec![Span::raw("  ")];
    preset_line.extend(presets);

    let lines = vec![
        Line::from(Span::styled("Alert Threshold", app.theme.header)),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled(threshold.to_string(), app.theme.reading),
        ]),
        Line::from(vec![
            Span::styled(format!("  {} ", Threshold::MIN), dim),
            Span::styled(slider(threshold, SLIDER_WIDTH), Style::default().fg(app.theme.highlight)),
            Span::styled(format!(" {}", Threshold::MAX), dim),
        ]),
        Line::from(Span::styled(
            format!(
                "  ←/→ ±{} ppm   PgUp/PgDn ±100 ppm   i type a value",
                THRESHOLD_STEP
            ),
            dim,
        )),
        Line::from(""),
        Line::from(Span::styled(" Presets", bold)),
        Line::from(preset_line),
        Line::from(""),
        Line::from(Span::styled(" Appearance", bold)),
        Line::from(format!(
            "  t  {} mode",
            if app.dark_mode() { "Dark" } else { "Light" }
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Sensors alert when a reading is above the threshold.",
            dim,
        )),
        Line::from(Span::styled("  Esc/Enter to close", dim)),
    ];

    let block = Block::default()
        .title(" Settings ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let overlay = centered_rect(area, 60, 18);
    frame.render_widget(Clear, overlay);
    frame.render_widget(Paragraph::new(lines).block(block), overlay);
}

/// Slider track with a knob at the threshold position.
fn slider(threshold: Threshold, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let span = (Threshold::MAX - Threshold::MIN) as usize;
    let offset = (threshold.ppm() - Threshold::MIN) as usize;
    let knob = offset * (width - 1) / span;
    (0..width)
        .map(|i| match i.cmp(&knob) {
            std::cmp::Ordering::Less => '━',
            std::cmp::Ordering::Equal => '●',
            std::cmp::Ordering::Greater => '─',
        })
        .collect()
}
