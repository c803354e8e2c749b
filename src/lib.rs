//! # gaswatch
//!
//! A terminal dashboard and library for three-sensor MQ gas boards that
//! report over UART.
//!
//! The board prints one line per sample. This crate frames the byte
//! stream into lines, decodes each line into three ppm readings, compares
//! them against a user threshold and keeps an edge-triggered event log of
//! alert and recovery transitions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐  │
//! │  │  app    │───▶│  sensor  │───▶│   ui    │───▶│ Terminal│  │
//! │  │ (state) │    │(evaluate)│    │(render) │    │         │  │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘  │
//! │       │ SessionEvent                                        │
//! │  ┌────┴────┐                                                │
//! │  │ session │◀── SerialTransport | TcpTransport | FileTransport
//! │  │ (input) │                                                │
//! │  └─────────┘                                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`session`]**: Device lifecycle ([`DeviceSession`]) over a pluggable
//!   [`Transport`], with a background read loop publishing [`SessionEvent`]s
//! - **[`sensor`]**: Line framing, the reading parser, threshold evaluation
//!   and the capped event log ([`Monitor`])
//! - **[`settings`]**: Persisted threshold and dark-mode flag
//! - **[`app`]** and **[`ui`]**: Dashboard state, key handling and ratatui rendering
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Auto-select a USB serial adapter
//! gaswatch
//!
//! # Fixed port and baud rate
//! gaswatch --port /dev/ttyUSB0 --baud 9600
//!
//! # Replay a captured log
//! gaswatch --replay capture.log
//! ```
//!
//! ### Evaluating lines without a device
//!
//! ```
//! use gaswatch::{parse_line, Monitor, SensorId, Threshold};
//!
//! let mut monitor = Monitor::new();
//! let readings = parse_line("GAS=450").readings().unwrap();
//! monitor.apply(&readings, Threshold::new(300));
//!
//! assert!(monitor.sensor(SensorId::Sensor1).is_alerting);
//! assert_eq!(
//!     monitor.events().next().unwrap().message,
//!     "Sensor 1 detected gas at 450 ppm"
//! );
//! ```
//!
//! ### Reading a device stream
//!
//! ```no_run
//! use gaswatch::{DeviceSession, SerialTransport, SessionEvent, DEFAULT_BAUD_RATE};
//!
//! # tokio_test::block_on(async {
//! let transport = SerialTransport::new(Some("/dev/ttyUSB0".to_string()));
//! let (mut session, mut events) = DeviceSession::new(Box::new(transport), DEFAULT_BAUD_RATE);
//! session.connect().await;
//!
//! while let Some(event) = events.recv().await {
//!     if let SessionEvent::Reading(readings) = event {
//!         println!("{:?}", readings.rounded());
//!     }
//! }
//! # });
//! ```

pub mod app;
pub mod events;
pub mod sensor;
pub mod session;
pub mod settings;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use sensor::{
    parse_line, Event, EventKind, LineFramer, Monitor, ParsedLine, Readings, SensorId,
    SensorState, SensorStatus, Threshold,
};
pub use session::{
    ConnectOutcome, ConnectionState, DeviceSession, FileTransport, SerialTransport,
    SessionEvent, TcpTransport, Transport, DEFAULT_BAUD_RATE,
};
pub use settings::{Settings, SettingsStore};
