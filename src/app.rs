//! Application state and user commands.
//!
//! The App is the only owner of sensor state. It drains the session's
//! event channel on the UI thread, so readings and threshold changes are
//! applied one at a time and never race.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;

use crate::sensor::{Monitor, SensorId, Threshold};
use crate::session::{
    ConnectOutcome, ConnectionState, DeviceSession, SessionEvent, NOT_SELECTED_MESSAGE,
};
use crate::settings::{Settings, SettingsStore};
use crate::ui::Theme;

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Threshold step for fine adjustment (matches the slider step).
pub const THRESHOLD_STEP: i64 = 10;
/// Threshold step for coarse adjustment.
pub const THRESHOLD_STEP_COARSE: i64 = 100;

/// Longest typed threshold, in digits.
const THRESHOLD_INPUT_LEN: usize = 4;

/// What the text prompt is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputTarget {
    /// A line to write to the device.
    #[default]
    Send,
    /// A threshold in ppm, typed in the settings overlay.
    Threshold,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub show_settings: bool,

    // Text prompt
    pub input_active: bool,
    pub input_target: InputTarget,
    pub input_text: String,

    // Device
    session: DeviceSession,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    /// Last connection problem, shown in the empty state.
    pub connection_message: Option<String>,
    pub last_reading_at: Option<Instant>,
    pub unparsed_lines: u64,

    // Sensors
    pub monitor: Monitor,

    // Settings
    settings: Settings,
    store: SettingsStore,

    // Deferred device work, run by the main loop between frames
    connect_requested: bool,
    disconnect_requested: bool,
    pending_send: Option<String>,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create an App around a session, its event channel and loaded settings.
    pub fn new(
        session: DeviceSession,
        events: mpsc::UnboundedReceiver<SessionEvent>,
        store: SettingsStore,
        settings: Settings,
    ) -> Self {
        Self {
            running: true,
            show_help: false,
            show_settings: false,
            input_active: false,
            input_target: InputTarget::Send,
            input_text: String::new(),
            session,
            events,
            connection_message: None,
            last_reading_at: None,
            unparsed_lines: 0,
            monitor: Monitor::new(),
            settings,
            store,
            connect_requested: false,
            disconnect_requested: false,
            pending_send: None,
            theme: Theme::for_mode(settings.dark_mode),
            status_message: None,
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// True while a connect has been requested but not yet run.
    pub fn is_connecting(&self) -> bool {
        self.connect_requested || self.session.state() == ConnectionState::Connecting
    }

    /// Name of the open device, if any.
    pub fn device(&self) -> Option<&str> {
        self.session.device()
    }

    /// Returns a description of the transport.
    pub fn source_description(&self) -> String {
        self.session.description()
    }

    pub fn baud_rate(&self) -> u32 {
        self.session.baud_rate()
    }

    pub fn threshold(&self) -> Threshold {
        self.settings.threshold
    }

    pub fn dark_mode(&self) -> bool {
        self.settings.dark_mode
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Apply every event waiting on the session channel.
    ///
    /// Returns the number of events applied.
    pub fn drain_session_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            self.apply_session_event(event);
            applied += 1;
        }
        applied
    }

    /// Apply one session event to the dashboard state.
    pub fn apply_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected { device } => {
                self.monitor.reset_readings(self.settings.threshold);
                self.connection_message = None;
                self.set_status_message(format!("Connected to {}", device));
            }
            SessionEvent::Reading(readings) => {
                self.monitor.apply(&readings, self.settings.threshold);
                self.last_reading_at = Some(Instant::now());
            }
            SessionEvent::Unparsed(_) => {
                self.unparsed_lines += 1;
            }
            SessionEvent::Disconnected { reason } => {
                self.connection_message = Some(reason.message().to_string());
            }
        }
    }

    /// Ask the main loop to (re)connect after the next frame.
    pub fn request_connect(&mut self) {
        self.connect_requested = true;
        self.connection_message = None;
    }

    /// Ask the main loop to close the device.
    pub fn request_disconnect(&mut self) {
        self.disconnect_requested = true;
    }

    /// Queue a line to send to the device.
    pub fn request_send(&mut self, data: String) {
        self.pending_send = Some(data);
    }

    /// True when deferred device work is waiting.
    pub fn has_pending_work(&self) -> bool {
        self.connect_requested || self.disconnect_requested || self.pending_send.is_some()
    }

    /// Run deferred connect, disconnect and send requests.
    pub async fn run_pending(&mut self) {
        if std::mem::take(&mut self.disconnect_requested) {
            self.disconnect().await;
        }
        if std::mem::take(&mut self.connect_requested) {
            self.connect().await;
        }
        if let Some(data) = self.pending_send.take() {
            self.send(&data).await;
        }
    }

    /// Connect to the device, recording any problem for display.
    pub async fn connect(&mut self) -> ConnectOutcome {
        let outcome = self.session.connect().await;
        self.connection_message = match &outcome {
            ConnectOutcome::Connected => None,
            ConnectOutcome::NotSelected => Some(NOT_SELECTED_MESSAGE.to_string()),
            ConnectOutcome::Failed(message) => Some(message.clone()),
        };
        outcome
    }

    pub async fn disconnect(&mut self) {
        self.session.disconnect().await;
    }

    /// Send a line to the device, reporting the result in the status bar.
    pub async fn send(&mut self, data: &str) -> bool {
        let was_connected = self.session.is_connected();
        let sent = self.session.send(data).await;
        if sent {
            self.set_status_message(format!("Sent: {}", data));
        } else if was_connected {
            self.set_status_message("Send failed: could not write to UART".to_string());
        } else {
            self.set_status_message("Send failed: UART not connected".to_string());
        }
        sent
    }

    /// Set the alert threshold; out-of-range values are clamped.
    pub fn set_threshold(&mut self, ppm: i64) {
        let threshold = Threshold::new(ppm);
        if threshold == self.settings.threshold {
            return;
        }
        self.settings.threshold = threshold;
        self.monitor.rethreshold(threshold);
        tracing::info!("threshold set to {}", threshold);
        self.persist_settings();
    }

    /// Move the threshold by `delta` ppm.
    pub fn adjust_threshold(&mut self, delta: i64) {
        self.set_threshold(self.settings.threshold.adjusted(delta).ppm());
    }

    /// Apply one of [`Threshold::PRESETS`] by index.
    pub fn apply_preset(&mut self, index: usize) {
        if let Some(preset) = Threshold::PRESETS.get(index) {
            self.set_threshold(preset.ppm());
        }
    }

    /// Switch between the dark and light theme.
    pub fn toggle_dark_mode(&mut self) {
        self.settings.dark_mode = !self.settings.dark_mode;
        self.theme = Theme::for_mode(self.settings.dark_mode);
        self.persist_settings();
    }

    fn persist_settings(&mut self) {
        if let Err(e) = self.store.save(&self.settings) {
            tracing::warn!("{}", e);
            self.set_status_message(format!("Settings not saved: {}", e));
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn open_settings(&mut self) {
        self.show_settings = true;
    }

    pub fn close_settings(&mut self) {
        self.show_settings = false;
    }

    /// Enter send-prompt input mode.
    pub fn start_input(&mut self) {
        self.input_active = true;
        self.input_target = InputTarget::Send;
        self.input_text.clear();
    }

    /// Enter threshold entry mode.
    pub fn start_threshold_input(&mut self) {
        self.input_active = true;
        self.input_target = InputTarget::Threshold;
        self.input_text.clear();
    }

    /// Add a typed character to the prompt.
    ///
    /// Threshold entry only takes digits, up to four of them.
    pub fn input_push(&mut self, c: char) {
        match self.input_target {
            InputTarget::Send => self.input_text.push(c),
            InputTarget::Threshold => {
                if c.is_ascii_digit() && self.input_text.len() < THRESHOLD_INPUT_LEN {
                    self.input_text.push(c);
                }
            }
        }
    }

    /// Leave input mode without sending.
    pub fn cancel_input(&mut self) {
        self.input_active = false;
        self.input_text.clear();
    }

    /// Leave input mode and act on the typed text.
    ///
    /// A send line is queued for the main loop; a threshold is applied
    /// at once (clamped to the valid range).
    pub fn submit_input(&mut self) {
        self.input_active = false;
        let text = std::mem::take(&mut self.input_text);
        if text.is_empty() {
            return;
        }
        match self.input_target {
            InputTarget::Send => self.request_send(text),
            InputTarget::Threshold => match text.parse::<i64>() {
                Ok(ppm) => self.set_threshold(ppm),
                Err(e) => self.set_status_message(format!("Invalid threshold: {}", e)),
            },
        }
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export sensor states, threshold, connection and events to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        let sensors: Vec<serde_json::Value> = SensorId::ALL
            .iter()
            .map(|id| {
                let state = self.monitor.sensor(*id);
                serde_json::json!({
                    "sensor": id.label(),
                    "reading": state.reading,
                    "status": state.status.label(),
                    "is_alerting": state.is_alerting,
                })
            })
            .collect();
        let events: Vec<_> = self.monitor.events().collect();

        let export = serde_json::json!({
            "connection": self.connection_state(),
            "device": self.device(),
            "threshold": self.settings.threshold,
            "sensors": sensors,
            "events": events,
        });

        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{Readings, SensorStatus};
    use crate::session::{
        DeviceIo, DisconnectReason, FileTransport, Transport, TransportError, DEFAULT_BAUD_RATE,
    };
    use async_trait::async_trait;
    use std::io::{self, Write};
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::{NamedTempFile, TempDir};
    use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

    /// Device that never produces data and rejects every write.
    struct BrokenPipe;

    impl AsyncRead for BrokenPipe {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Pending
        }
    }

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[derive(Debug)]
    struct BrokenPipeTransport;

    #[async_trait]
    impl Transport for BrokenPipeTransport {
        async fn request_device(&self) -> Option<String> {
            Some("/dev/broken0".to_string())
        }

        async fn open(
            &self,
            _device: &str,
            _baud_rate: u32,
        ) -> Result<Box<dyn DeviceIo>, TransportError> {
            Ok(Box::new(BrokenPipe))
        }

        fn description(&self) -> String {
            "broken".to_string()
        }
    }

    fn app_with_transport(transport: FileTransport, dir: &TempDir) -> App {
        let (session, events) = DeviceSession::new(Box::new(transport), DEFAULT_BAUD_RATE);
        let store = SettingsStore::new(dir.path().join("settings.json"));
        App::new(session, events, store, Settings::default())
    }

    fn offline_app(dir: &TempDir) -> App {
        app_with_transport(FileTransport::new("/nonexistent/capture.log"), dir)
    }

    #[test]
    fn test_readings_update_monitor_with_current_threshold() {
        let dir = TempDir::new().unwrap();
        let mut app = offline_app(&dir);

        app.apply_session_event(SessionEvent::Reading(Readings::new(450.0, 0.0, 0.0)));
        let s1 = app.monitor.sensor(SensorId::Sensor1);
        assert_eq!(s1.status, SensorStatus::Alerting);
        assert!(app.last_reading_at.is_some());

        app.set_threshold(500);
        assert!(!app.monitor.sensor(SensorId::Sensor1).is_alerting);
    }

    #[test]
    fn test_threshold_is_clamped_and_persisted() {
        let dir = TempDir::new().unwrap();
        let mut app = offline_app(&dir);

        app.set_threshold(5000);
        assert_eq!(app.threshold().ppm(), 2000);
        app.set_threshold(-5);
        assert_eq!(app.threshold().ppm(), 0);

        app.apply_preset(2);
        assert_eq!(app.threshold().ppm(), 500);
        app.adjust_threshold(THRESHOLD_STEP);
        assert_eq!(app.threshold().ppm(), 510);

        let stored = SettingsStore::new(dir.path().join("settings.json")).load().unwrap();
        assert_eq!(stored.threshold.ppm(), 510);
    }

    #[test]
    fn test_dark_mode_toggle_is_persisted() {
        let dir = TempDir::new().unwrap();
        let mut app = offline_app(&dir);

        app.toggle_dark_mode();
        assert!(app.dark_mode());
        let stored = SettingsStore::new(dir.path().join("settings.json")).load().unwrap();
        assert!(stored.dark_mode);
    }

    #[test]
    fn test_lost_connection_message() {
        let dir = TempDir::new().unwrap();
        let mut app = offline_app(&dir);

        app.apply_session_event(SessionEvent::Disconnected {
            reason: DisconnectReason::Lost,
        });
        assert_eq!(
            app.connection_message.as_deref(),
            Some("UART connection lost. Please reconnect.")
        );
    }

    #[test]
    fn test_unparsed_lines_do_not_touch_sensors() {
        let dir = TempDir::new().unwrap();
        let mut app = offline_app(&dir);

        app.apply_session_event(SessionEvent::Unparsed("not a number".to_string()));
        assert_eq!(app.unparsed_lines, 1);
        assert_eq!(app.monitor.lines_applied(), 0);
        assert_eq!(app.monitor.event_count(), 0);
    }

    #[test]
    fn test_send_prompt_queues_data() {
        let dir = TempDir::new().unwrap();
        let mut app = offline_app(&dir);

        app.start_input();
        app.input_text.push_str("CAL");
        app.submit_input();
        assert!(!app.input_active);
        assert!(app.has_pending_work());
    }

    #[test]
    fn test_typed_threshold_is_applied() {
        let dir = TempDir::new().unwrap();
        let mut app = offline_app(&dir);

        app.start_threshold_input();
        for c in "3a0.5".chars() {
            app.input_push(c);
        }
        assert_eq!(app.input_text, "305");
        app.submit_input();
        assert_eq!(app.threshold().ppm(), 305);
        assert!(!app.has_pending_work());

        // Out-of-range entries are clamped
        app.start_threshold_input();
        for c in "99999".chars() {
            app.input_push(c);
        }
        assert_eq!(app.input_text, "9999");
        app.submit_input();
        assert_eq!(app.threshold().ppm(), 2000);
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_separately() {
        let dir = TempDir::new().unwrap();
        let (session, events) =
            DeviceSession::new(Box::new(BrokenPipeTransport), DEFAULT_BAUD_RATE);
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let mut app = App::new(session, events, store, Settings::default());

        assert!(!app.send("PING").await);
        assert_eq!(app.get_status_message(), Some("Send failed: UART not connected"));

        assert_eq!(app.connect().await, ConnectOutcome::Connected);
        assert!(!app.send("PING").await);
        assert_eq!(
            app.get_status_message(),
            Some("Send failed: could not write to UART")
        );
        app.disconnect().await;
    }

    #[tokio::test]
    async fn test_missing_device_reports_not_selected() {
        let dir = TempDir::new().unwrap();
        let mut app = offline_app(&dir);

        assert_eq!(app.connect().await, ConnectOutcome::NotSelected);
        assert_eq!(app.connection_message.as_deref(), Some(NOT_SELECTED_MESSAGE));
        assert!(!app.send("PING").await);
    }

    #[tokio::test]
    async fn test_replayed_capture_drives_dashboard() {
        let dir = TempDir::new().unwrap();
        let mut capture = NamedTempFile::new().unwrap();
        writeln!(capture, "GAS=450").unwrap();
        writeln!(capture, "garbage").unwrap();
        writeln!(capture, "GAS=100").unwrap();

        let mut app = app_with_transport(FileTransport::new(capture.path()), &dir);
        app.set_threshold(300);
        assert_eq!(app.connect().await, ConnectOutcome::Connected);

        // Drain until the replay hits end of file
        let deadline = Instant::now() + Duration::from_secs(2);
        while app.connection_message.is_none() && Instant::now() < deadline {
            app.drain_session_events();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let messages: Vec<&str> = app.monitor.events().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Sensor 1 returned to safe level (100 ppm)",
                "Sensor 1 detected gas at 450 ppm",
            ]
        );
        assert_eq!(app.unparsed_lines, 1);
        assert_eq!(
            app.connection_message.as_deref(),
            Some("UART connection lost. Please reconnect.")
        );
        assert!(!app.is_connected());
    }

    #[test]
    fn test_export_writes_json() {
        let dir = TempDir::new().unwrap();
        let mut app = offline_app(&dir);
        app.apply_session_event(SessionEvent::Reading(Readings::new(10.0, 400.0, 0.0)));

        let path = dir.path().join("export.json");
        app.export_state(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["threshold"], 300);
        assert_eq!(value["sensors"][1]["reading"], 400);
        assert_eq!(value["events"][0]["message"], "Sensor 2 detected gas at 400 ppm");
        assert_eq!(value["connection"], "Disconnected");
    }
}
