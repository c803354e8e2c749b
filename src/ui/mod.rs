//! Terminal UI rendering using ratatui.
//!
//! ## Submodules
//!
//! - [`sensors`]: The three sensor panels
//! - [`log`]: Event log, newest first
//! - [`settings`]: Threshold and theme overlay
//! - [`common`]: Shared components (header, status bar, empty state, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├────────────┬────────────┬────────────┤
//! │ Sensor 1   │ Sensor 2   │ Sensor 3   │
//! │ (sensors::render)                    │
//! ├────────────┴────────────┴────────────┤
//! │ Event Log (log::render)              │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    While disconnected the middle is replaced by
//!    common::render_empty_state.
//!    Overlays rendered on top:
//!    - settings::render_overlay
//!    - common::render_help
//! ```

pub mod common;
pub mod log;
pub mod sensors;
pub mod settings;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

/// Minimum terminal width for a usable display.
pub const MIN_WIDTH: u16 = 60;
/// Minimum terminal height for a usable display.
pub const MIN_HEIGHT: u16 = 20;

/// Height of the sensor panel row.
const SENSOR_PANEL_HEIGHT: u16 = 9;

/// Draw the whole dashboard.
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Check for minimum terminal size
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let top = (area.height / 2).saturating_sub(2);
        let centered = Rect::new(0, top, area.width, 5u16.min(area.height - top));
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Min(8),    // Content
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);

    if app.is_connected() {
        let content = Layout::vertical([
            Constraint::Length(SENSOR_PANEL_HEIGHT),
            Constraint::Min(4),
        ])
        .split(chunks[1]);
        sensors::render(frame, app, content[0]);
        log::render(frame, app, content[1]);
    } else {
        common::render_empty_state(frame, app, chunks[1]);
    }

    common::render_status_bar(frame, app, chunks[2]);

    if app.show_settings {
        settings::render_overlay(frame, app, area);
    }

    // Render help overlay if active
    if app.show_help {
        common::render_help(frame, app, area);
    }
}
