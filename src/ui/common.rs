//! Common UI components.
//!
//! This module contains the header bar, status bar, help overlay and the
//! empty state shown while no device is connected.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputTarget};
use crate::session::ConnectionState;

/// Dashboard title.
pub const TITLE: &str = "Gas Monitoring System – 3 MQ Sensors";

/// Render the header bar with the title and connection indicator.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.connection_state();
    let (indicator_style, label) = if app.is_connecting() {
        (
            Style::default().fg(app.theme.pending),
            ConnectionState::Connecting.label(),
        )
    } else {
        let style = match state {
            ConnectionState::Connected => Style::default().fg(app.theme.safe),
            ConnectionState::Error(_) => Style::default().fg(app.theme.alert),
            _ => Style::default().fg(app.theme.muted),
        };
        (style, state.label())
    };

    let mut spans = vec![
        Span::styled(format!(" {} ", TITLE), app.theme.header),
        Span::raw("│ "),
        Span::styled("● ", indicator_style),
        Span::styled(label, indicator_style.add_modifier(Modifier::BOLD)),
    ];
    if let Some(device) = app.device() {
        spans.push(Span::styled(
            format!(" ({})", device),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }

    let alerting = app.monitor.alerting_count();
    if alerting > 0 && app.is_connected() {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("{} alerting", alerting),
            Style::default().fg(app.theme.alert).add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the status bar at the bottom.
///
/// Shows the send prompt while typing, otherwise a temporary status
/// message, otherwise threshold, feed age and the available controls.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if app.input_active {
        let label = match app.input_target {
            InputTarget::Send => " Send: ",
            InputTarget::Threshold => " Threshold (ppm): ",
        };
        let line = Line::from(vec![
            Span::styled(label, Style::default().fg(app.theme.highlight)),
            Span::raw(app.input_text.as_str()),
            Span::styled("█", Style::default().fg(app.theme.highlight)),
            Span::styled(
                "  Enter:apply Esc:cancel",
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = if app.show_settings {
        "←/→:±10 PgUp/PgDn:±100 1-4:preset i:type t:theme Esc:close"
    } else if app.is_connected() {
        "d:disconnect ::send s:settings t:theme e:export ?:help q:quit"
    } else {
        "c:connect s:settings t:theme e:export ?:help q:quit"
    };

    let feed = match app.last_reading_at {
        Some(at) if app.is_connected() => {
            format!("Last reading {:.1}s ago", at.elapsed().as_secs_f64())
        }
        _ => app.source_description(),
    };

    let status = format!(" Threshold {} | {} | {}", app.threshold(), feed, controls);
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the panel shown while no device is connected.
///
/// Displays the last connection problem and how to connect.
pub fn render_empty_state(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("UART Connection Required", app.theme.header)),
        Line::from(""),
    ];

    if app.is_connecting() {
        lines.push(Line::from(Span::styled(
            "Connecting...",
            Style::default().fg(app.theme.pending),
        )));
    } else {
        if let Some(message) = &app.connection_message {
            lines.push(Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(app.theme.alert),
            )));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(
            "Connect the gas sensor board over UART to view live readings.",
        ));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::raw("Press "),
            Span::styled("c", app.theme.header),
            Span::raw(" to connect"),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("{} @ {} baud", app.source_description(), app.baud_rate()),
        Style::default().add_modifier(Modifier::DIM),
    )));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the dashboard.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Connection",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  c         Connect / reconnect"),
        Line::from("  d         Disconnect"),
        Line::from("  :         Send a line to the device"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Settings",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  s         Open settings"),
        Line::from("  ←/→       Threshold ±10 ppm"),
        Line::from("  PgUp/PgDn Threshold ±100 ppm"),
        Line::from("  1-4       Threshold presets"),
        Line::from("  i         Type a threshold"),
        Line::from("  t         Toggle dark mode"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_area = centered_rect(area, 42, 26);

    // Clear the area behind the help
    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Center a box of at most `width` x `height` inside `area`.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
