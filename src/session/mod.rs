//! Device session: connection lifecycle and the session event channel.
//!
//! A [`DeviceSession`] owns one [`Transport`] and at most one open
//! device. While connected, a background task reads the device, frames
//! and parses lines, and publishes [`SessionEvent`]s on a single
//! channel. Events from one stream arrive in order, and its final
//! `Disconnected` event always comes after its last reading.
//!
//! ```text
//!  connect()                       background task
//! ┌──────────────────┐   spawn    ┌─────────────────────────┐
//! │ request_device() │──────────▶ │ read ─▶ frame ─▶ parse  │
//! │ open(baud)       │            └────────────┬────────────┘
//! └──────────────────┘                         │ SessionEvent
//!                                              ▼
//!                                       subscriber (App)
//! ```
//!
//! Reconnection is always caller-driven: after a lost connection the
//! session stays disconnected until [`DeviceSession::connect`] is called
//! again.

mod reader;
pub mod transport;

pub use transport::{
    DeviceIo, FileTransport, SerialTransport, TcpTransport, Transport, TransportError,
    DEFAULT_BAUD_RATE,
};

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncWriteExt, WriteHalf};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::sensor::Readings;

/// Shown when no device was selected.
pub const NOT_SELECTED_MESSAGE: &str =
    "Failed to connect to UART. Please select a valid serial port.";

/// Connection lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

impl ConnectionState {
    /// Returns the status text shown in the header.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Not Connected",
            ConnectionState::Connecting => "Connecting...",
            ConnectionState::Connected => "Connected to UART",
            ConnectionState::Error(_) => "Connection Error",
        }
    }
}

/// Why a read loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// End of stream or read error: the device went away.
    Lost,
    /// The session closed the connection.
    Closed,
}

impl DisconnectReason {
    /// User-facing message for this reason.
    pub fn message(&self) -> &'static str {
        match self {
            DisconnectReason::Lost => "UART connection lost. Please reconnect.",
            DisconnectReason::Closed => "Disconnected from UART.",
        }
    }
}

/// Events published by a session, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A device was opened and the read loop started.
    Connected { device: String },
    /// A line was parsed into readings.
    Reading(Readings),
    /// A line matched none of the known encodings.
    Unparsed(String),
    /// The read loop ended and the device was released.
    Disconnected { reason: DisconnectReason },
}

/// Result of [`DeviceSession::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected,
    /// Selection was cancelled or no device is available. Not an error.
    NotSelected,
    /// The device could not be opened; carries the user-facing message.
    Failed(String),
}

/// The open device and its read task.
struct ActiveConnection {
    device: String,
    writer: WriteHalf<Box<dyn DeviceIo>>,
    cancel: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Owns the connection to one device.
pub struct DeviceSession {
    transport: Box<dyn Transport>,
    baud_rate: u32,
    state: Arc<watch::Sender<ConnectionState>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    active: Option<ActiveConnection>,
}

impl fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSession")
            .field("transport", &self.transport)
            .field("baud_rate", &self.baud_rate)
            .field("state", &*self.state.borrow())
            .field("device", &self.device())
            .finish()
    }
}

impl DeviceSession {
    /// Create a disconnected session and the receiving end of its event channel.
    ///
    /// Dropping the receiver unsubscribes; a running read loop then stops
    /// at its next line.
    pub fn new(
        transport: Box<dyn Transport>,
        baud_rate: u32,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let session = Self {
            transport,
            baud_rate,
            state: Arc::new(state),
            events,
            active: None,
        };
        (session, rx)
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Watch connection state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.state.borrow() == ConnectionState::Connected
    }

    /// Name of the open device, if any.
    pub fn device(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.device.as_str())
    }

    /// Returns a description of the underlying transport.
    pub fn description(&self) -> String {
        self.transport.description()
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Select and open a device, then start reading it.
    ///
    /// Any existing connection is closed first. Failures never escape as
    /// errors: they are reported through the outcome and the state.
    pub async fn connect(&mut self) -> ConnectOutcome {
        self.disconnect().await;
        self.state.send_replace(ConnectionState::Connecting);

        let Some(device) = self.transport.request_device().await else {
            tracing::info!("no device selected on {}", self.transport.description());
            self.state.send_replace(ConnectionState::Disconnected);
            return ConnectOutcome::NotSelected;
        };

        let io = match self.transport.open(&device, self.baud_rate).await {
            Ok(io) => io,
            Err(e) => {
                tracing::warn!("failed to open {}: {}", device, e);
                let message = format!("Connection error: {}", e);
                self.state.send_replace(ConnectionState::Error(message.clone()));
                return ConnectOutcome::Failed(message);
            }
        };

        tracing::info!("connected to {} at {} baud", device, self.baud_rate);
        let (reader, writer) = tokio::io::split(io);
        let (cancel, cancel_rx) = oneshot::channel();

        self.state.send_replace(ConnectionState::Connected);
        let _ = self.events.send(SessionEvent::Connected {
            device: device.clone(),
        });

        let task = tokio::spawn(reader::read_loop(
            reader,
            self.events.clone(),
            self.state.clone(),
            cancel_rx,
        ));

        self.active = Some(ActiveConnection {
            device,
            writer,
            cancel,
            task,
        });
        ConnectOutcome::Connected
    }

    /// Stop the read loop and close the device. Does nothing when idle.
    pub async fn disconnect(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        // The loop may already have ended on its own
        let _ = active.cancel.send(());
        if let Err(e) = active.task.await {
            tracing::warn!("read loop for {} ended abnormally: {}", active.device, e);
        }

        let mut writer = active.writer;
        if let Err(e) = writer.shutdown().await {
            tracing::debug!("closing {}: {}", active.device, e);
        }
        drop(writer);

        tracing::info!("disconnected from {}", active.device);
        self.state.send_replace(ConnectionState::Disconnected);
    }

    /// Write `data` followed by a newline to the device.
    ///
    /// Returns `false` when no device is open or the write fails.
    pub async fn send(&mut self, data: &str) -> bool {
        if !self.is_connected() {
            tracing::warn!("send requested with no open device");
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            return false;
        };

        let payload = format!("{}\n", data);
        let result = async {
            active.writer.write_all(payload.as_bytes()).await?;
            active.writer.flush().await
        }
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("send to {} failed: {}", active.device, e);
                false
            }
        }
    }
}
