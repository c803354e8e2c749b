//! Event log rendering.

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::sensor::{EventKind, MAX_EVENTS};

/// Render the event log, newest first.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(
            " Event Log ({}/{}) ",
            app.monitor.event_count(),
            MAX_EVENTS
        ))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if app.monitor.event_count() == 0 {
        let paragraph = Paragraph::new("No events yet")
            .block(block)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM));
        frame.render_widget(paragraph, area);
        return;
    }

    let rows: Vec<Row> = app
        .monitor
        .events()
        .map(|event| {
            let marker = match event.kind {
                EventKind::Alert => "▲",
                EventKind::Normal => "▼",
            };
            Row::new(vec![
                Cell::from(event.timestamp.clone())
                    .style(Style::default().add_modifier(Modifier::DIM)),
                Cell::from(marker).style(app.theme.event_style(event.kind)),
                Cell::from(event.message.clone()).style(app.theme.event_style(event.kind)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8), // HH:MM:SS
        Constraint::Length(1),
        Constraint::Min(20),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Time", "", "Event"]).style(app.theme.header))
        .block(block)
        .column_spacing(1);

    frame.render_widget(table, area);
}
