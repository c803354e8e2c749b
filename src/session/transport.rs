//! Device transports.
//!
//! A [`Transport`] knows how to pick a device and open it as a byte
//! stream. The session splits the opened stream into its readable and
//! writable halves and closes it by shutting down and dropping it.

use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::{SerialPortBuilderExt, SerialPortInfo, SerialPortType};

/// Default UART speed of the sensor boards.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// An open device: readable and writable byte stream.
pub trait DeviceIo: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> DeviceIo for T {}

/// Errors raised while opening a device.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The serial port could not be opened.
    #[error("failed to open serial port {device}: {source}")]
    Serial {
        device: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// Any other I/O failure (TCP connect, file open).
    #[error("failed to open {device}: {source}")]
    Io {
        device: String,
        #[source]
        source: io::Error,
    },
}

/// Source of device streams.
///
/// Implementations resolve which device to use and open it. Returning
/// `None` from [`Transport::request_device`] means no device was chosen
/// (cancelled, none present, or the capability is missing).
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Pick a device, returning its name.
    async fn request_device(&self) -> Option<String>;

    /// Open the named device at the given baud rate.
    async fn open(&self, device: &str, baud_rate: u32) -> Result<Box<dyn DeviceIo>, TransportError>;

    /// Returns a human-readable description of the transport.
    fn description(&self) -> String;
}

/// Serial port transport backed by `tokio-serial`.
#[derive(Debug, Clone, Default)]
pub struct SerialTransport {
    port: Option<String>,
}

impl SerialTransport {
    /// Use a fixed port, or auto-select when `port` is `None`.
    pub fn new(port: Option<String>) -> Self {
        Self { port }
    }

    /// Serial ports currently present on the host.
    pub fn available_ports() -> Vec<SerialPortInfo> {
        match tokio_serial::available_ports() {
            Ok(ports) => ports,
            Err(e) => {
                tracing::warn!("serial port enumeration failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Pick a port, preferring USB adapters.
pub fn choose_port(ports: &[SerialPortInfo]) -> Option<&SerialPortInfo> {
    ports
        .iter()
        .find(|p| matches!(p.port_type, SerialPortType::UsbPort(_)))
        .or_else(|| ports.first())
}

#[async_trait]
impl Transport for SerialTransport {
    async fn request_device(&self) -> Option<String> {
        if let Some(port) = &self.port {
            return Some(port.clone());
        }

        let ports = Self::available_ports();
        let chosen = choose_port(&ports).map(|p| p.port_name.clone());
        match &chosen {
            Some(name) => tracing::info!("auto-selected serial port {}", name),
            None => tracing::info!("no serial ports found"),
        }
        chosen
    }

    async fn open(&self, device: &str, baud_rate: u32) -> Result<Box<dyn DeviceIo>, TransportError> {
        let stream = tokio_serial::new(device, baud_rate)
            .open_native_async()
            .map_err(|source| TransportError::Serial {
                device: device.to_string(),
                source,
            })?;
        Ok(Box::new(stream))
    }

    fn description(&self) -> String {
        match &self.port {
            Some(port) => format!("serial: {}", port),
            None => "serial: auto".to_string(),
        }
    }
}

/// TCP transport, for serial-over-network bridges such as ser2net.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    addr: String,
}

impl TcpTransport {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn request_device(&self) -> Option<String> {
        Some(self.addr.clone())
    }

    async fn open(&self, device: &str, _baud_rate: u32) -> Result<Box<dyn DeviceIo>, TransportError> {
        let stream = tokio::net::TcpStream::connect(device)
            .await
            .map_err(|source| TransportError::Io {
                device: device.to_string(),
                source,
            })?;
        Ok(Box::new(stream))
    }

    fn description(&self) -> String {
        format!("tcp: {}", self.addr)
    }
}

/// Replays a captured UART log as if it were the device.
///
/// The file is opened read-only, so sends fail.
#[derive(Debug, Clone)]
pub struct FileTransport {
    path: PathBuf,
}

impl FileTransport {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Transport for FileTransport {
    async fn request_device(&self) -> Option<String> {
        self.path.exists().then(|| self.path.display().to_string())
    }

    async fn open(&self, device: &str, _baud_rate: u32) -> Result<Box<dyn DeviceIo>, TransportError> {
        let file = tokio::fs::File::open(device)
            .await
            .map_err(|source| TransportError::Io {
                device: device.to_string(),
                source,
            })?;
        Ok(Box::new(file))
    }

    fn description(&self) -> String {
        format!("file: {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::io::AsyncReadExt;
    use tokio_serial::UsbPortInfo;

    fn port(name: &str, port_type: SerialPortType) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.to_string(),
            port_type,
        }
    }

    #[test]
    fn test_choose_port_prefers_usb() {
        let usb = SerialPortType::UsbPort(UsbPortInfo {
            vid: 0x1a86,
            pid: 0x7523,
            serial_number: None,
            manufacturer: None,
            product: None,
        });
        let ports = vec![
            port("/dev/ttyS0", SerialPortType::Unknown),
            port("/dev/ttyUSB0", usb),
        ];
        assert_eq!(choose_port(&ports).unwrap().port_name, "/dev/ttyUSB0");
    }

    #[test]
    fn test_choose_port_falls_back_to_first() {
        let ports = vec![port("/dev/ttyS0", SerialPortType::Unknown)];
        assert_eq!(choose_port(&ports).unwrap().port_name, "/dev/ttyS0");
        assert!(choose_port(&[]).is_none());
    }

    #[tokio::test]
    async fn test_fixed_serial_port_is_selected() {
        let transport = SerialTransport::new(Some("/dev/ttyACM0".to_string()));
        assert_eq!(transport.request_device().await.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(transport.description(), "serial: /dev/ttyACM0");
    }

    #[tokio::test]
    async fn test_file_transport_replays_contents() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "GAS=12").unwrap();

        let transport = FileTransport::new(file.path());
        let device = transport.request_device().await.unwrap();
        let mut io = transport.open(&device, DEFAULT_BAUD_RATE).await.unwrap();

        let mut content = String::new();
        io.read_to_string(&mut content).await.unwrap();
        assert_eq!(content, "GAS=12\n");
    }

    #[tokio::test]
    async fn test_file_transport_missing_file_selects_nothing() {
        let transport = FileTransport::new("/nonexistent/capture.log");
        assert!(transport.request_device().await.is_none());
    }

    #[tokio::test]
    async fn test_tcp_transport_selects_address() {
        let transport = TcpTransport::new("localhost:3333");
        assert_eq!(transport.request_device().await.as_deref(), Some("localhost:3333"));
        assert_eq!(transport.description(), "tcp: localhost:3333");
    }
}
