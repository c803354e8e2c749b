use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, THRESHOLD_STEP, THRESHOLD_STEP_COARSE};

/// File written by the export key.
const EXPORT_PATH: &str = "gaswatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Ctrl-C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.input_active {
        handle_text_input(app, key);
        return;
    }

    if app.show_settings {
        handle_settings_key(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),

        // Connection
        KeyCode::Char('c') => app.request_connect(),
        KeyCode::Char('d') => {
            if app.is_connected() {
                app.request_disconnect();
            }
        }

        KeyCode::Char('s') => app.open_settings(),
        KeyCode::Char('t') => app.toggle_dark_mode(),
        KeyCode::Char(':') => {
            if app.is_connected() {
                app.start_input();
            } else {
                app.set_status_message("Connect to UART before sending".to_string());
            }
        }

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Export
        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_PATH);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Keys for the settings overlay
fn handle_settings_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('s') | KeyCode::Char('q') => {
            app.close_settings();
        }
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-') => {
            app.adjust_threshold(-THRESHOLD_STEP)
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') => {
            app.adjust_threshold(THRESHOLD_STEP)
        }
        KeyCode::PageDown => app.adjust_threshold(-THRESHOLD_STEP_COARSE),
        KeyCode::PageUp => app.adjust_threshold(THRESHOLD_STEP_COARSE),
        KeyCode::Char(c @ '1'..='4') => {
            if let Some(index) = c.to_digit(10) {
                app.apply_preset(index as usize - 1);
            }
        }
        KeyCode::Char('t') => app.toggle_dark_mode(),
        KeyCode::Char('i') => app.start_threshold_input(),
        _ => {}
    }
}

/// Handle key input while the send or threshold prompt is active
fn handle_text_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_input(),
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Backspace => {
            app.input_text.pop();
        }
        KeyCode::Char(c) => app.input_push(c),
        _ => {}
    }
}
