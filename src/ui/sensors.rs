//! Sensor panels.
//!
//! One bordered panel per sensor, side by side:
//!
//! ```text
//! ╭ Sensor 1 ─────────╮
//! │      450 ppm      │
//! │ ▁▁▁▁▂▂▂▂▃▃▃▃▄     │
//! │ Threshold 300 ppm │
//! │ ● Alert  Buzzer ON│
//! │   [Gas Detected]  │
//! ╰───────────────────╯
//! ```

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::sensor::{SensorId, SensorState, SensorStatus, Threshold};

/// Level bar characters (8 levels of height).
const LEVEL_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the three sensor panels.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::horizontal([
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
        Constraint::Ratio(1, 3),
    ])
    .split(area);

    for (id, column) in SensorId::ALL.iter().zip(columns.iter()) {
        render_panel(frame, app, *id, *column);
    }
}

fn render_panel(frame: &mut Frame, app: &App, id: SensorId, area: Rect) {
    let state = app.monitor.sensor(id);
    let threshold = app.threshold();
    let status_style = app.theme.status_style(state.status);

    let border_style = if state.is_alerting {
        Style::default().fg(app.theme.alert)
    } else {
        Style::default().fg(app.theme.border)
    };
    let block = Block::default()
        .title(format!(" {} ", id))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(border_style);

    let inner_width = area.width.saturating_sub(4) as usize;
    let (led, buzzer) = indicator_labels(state);

    let lines = vec![
        Line::from(vec![
            Span::styled(state.reading.to_string(), app.theme.reading),
            Span::raw(" ppm"),
        ]),
        Line::from(Span::styled(
            level_bar(state.reading, inner_width),
            status_style,
        )),
        Line::from(Span::styled(
            format!("Threshold {}", threshold),
            Style::default().add_modifier(Modifier::DIM),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("● ", status_style),
            Span::styled(led, status_style),
            Span::raw("   "),
            Span::styled(
                buzzer,
                if state.is_alerting {
                    Style::default().fg(app.theme.alert).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().add_modifier(Modifier::DIM)
                },
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!("[ {} ]", state.status.label()),
            status_style.add_modifier(Modifier::REVERSED),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

/// LED and buzzer labels for a sensor.
fn indicator_labels(state: &SensorState) -> (&'static str, &'static str) {
    match state.status {
        SensorStatus::Alerting => ("Alert", "Buzzer ON"),
        SensorStatus::Safe => ("Safe", "Buzzer OFF"),
    }
}

/// Bar of `width` cells filled in proportion to the reading over the
/// threshold range.
fn level_bar(reading: i64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let span = (Threshold::MAX - Threshold::MIN) as f64;
    let fraction = ((reading - Threshold::MIN) as f64 / span).clamp(0.0, 1.0);
    let filled = fraction * width as f64;

    (0..width)
        .map(|cell| {
            let level = (filled - cell as f64).clamp(0.0, 1.0);
            if level <= 0.0 {
                ' '
            } else {
                let idx = ((level * 7.0).round() as usize).min(7);
                LEVEL_CHARS[idx]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bar_scales_to_range() {
        assert_eq!(level_bar(0, 10), " ".repeat(10));
        assert_eq!(level_bar(2000, 4), "████");
        assert_eq!(level_bar(5000, 4), "████");
        assert_eq!(level_bar(1000, 4), "██  ");
        assert_eq!(level_bar(-10, 3), "   ");
        assert_eq!(level_bar(100, 0), "");
    }

    #[test]
    fn test_indicator_labels() {
        let alerting = SensorState::evaluate(450, Threshold::new(300));
        assert_eq!(indicator_labels(&alerting), ("Alert", "Buzzer ON"));

        let safe = SensorState::evaluate(300, Threshold::new(300));
        assert_eq!(indicator_labels(&safe), ("Safe", "Buzzer OFF"));
    }
}
