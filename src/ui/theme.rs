//! Theme configuration for the TUI.
//!
//! Supports light and dark themes. The choice is a persisted user setting;
//! terminal detection only picks the initial value.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::sensor::{EventKind, SensorStatus};

/// Color and style theme for the TUI.
///
/// Use [`Theme::for_mode()`] to follow the dark-mode setting, or
/// [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Whether this is the dark variant.
    pub is_dark: bool,
    /// Accent color for titles and active elements.
    pub highlight: Color,
    /// Color for sensors above the threshold.
    pub alert: Color,
    /// Color for sensors at or below the threshold.
    pub safe: Color,
    /// Color for in-progress states such as connecting.
    pub pending: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color for secondary text.
    pub muted: Color,
    /// Style for section headers.
    pub header: Style,
    /// Style for the large reading figures.
    pub reading: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            is_dark: true,
            highlight: Color::Cyan,
            alert: Color::LightRed,
            safe: Color::LightGreen,
            pending: Color::Yellow,
            border: Color::Gray,
            muted: Color::DarkGray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            reading: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            is_dark: false,
            highlight: Color::Blue,
            alert: Color::Red,
            safe: Color::Green,
            pending: Color::Yellow,
            border: Color::DarkGray,
            muted: Color::Gray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            reading: Style::default().fg(Color::Black).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Theme for the dark-mode setting
    pub fn for_mode(dark_mode: bool) -> Self {
        if dark_mode {
            Self::dark()
        } else {
            Self::light()
        }
    }

    /// Get style for a sensor status
    pub fn status_style(&self, status: SensorStatus) -> Style {
        match status {
            SensorStatus::Safe => Style::default().fg(self.safe),
            SensorStatus::Alerting => Style::default().fg(self.alert).add_modifier(Modifier::BOLD),
        }
    }

    /// Get style for an event log entry
    pub fn event_style(&self, kind: EventKind) -> Style {
        match kind {
            EventKind::Alert => Style::default().fg(self.alert),
            EventKind::Normal => Style::default().fg(self.safe),
        }
    }
}

/// True unless the terminal reports a light background.
pub fn terminal_is_dark() -> bool {
    // Use terminal-light crate to detect background luminance
    !matches!(terminal_light::luma(), Ok(luma) if luma > 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_mode_selects_variant() {
        assert!(Theme::for_mode(true).is_dark);
        assert!(!Theme::for_mode(false).is_dark);
    }

    #[test]
    fn test_alerting_is_bold() {
        let theme = Theme::dark();
        let style = theme.status_style(SensorStatus::Alerting);
        assert_eq!(style.fg, Some(theme.alert));
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(theme.status_style(SensorStatus::Safe).fg, Some(theme.safe));
    }
}
