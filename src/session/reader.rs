//! Background read loop for an open device.
//!
//! Reads chunks from the device, frames them into lines and publishes
//! parsed readings on the session channel until the stream ends, fails
//! or the session cancels it.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, oneshot, watch};

use super::{ConnectionState, DisconnectReason, SessionEvent};
use crate::sensor::{parse_line, LineFramer};

/// Bytes requested from the device per read.
const READ_CHUNK_SIZE: usize = 1024;

/// Run until end of stream, read error or cancellation.
///
/// The reader is dropped before the final `Disconnected` event is sent,
/// so every exit path releases the device's read half.
pub(super) async fn read_loop<R>(
    mut reader: R,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
    mut cancel: oneshot::Receiver<()>,
) where
    R: AsyncRead + Unpin,
{
    let mut framer = LineFramer::new();
    let mut buf = [0u8; READ_CHUNK_SIZE];

    let reason = loop {
        tokio::select! {
            _ = &mut cancel => break DisconnectReason::Closed,
            result = reader.read(&mut buf) => match result {
                Ok(0) => {
                    tracing::info!("device stream ended");
                    break DisconnectReason::Lost;
                }
                Ok(n) => {
                    let delivered = framer
                        .push_bytes(&buf[..n])
                        .iter()
                        .all(|line| dispatch_line(line, &events));
                    if !delivered {
                        // Receiver dropped
                        break DisconnectReason::Closed;
                    }
                }
                Err(e) => {
                    tracing::warn!("device read error: {}", e);
                    break DisconnectReason::Lost;
                }
            }
        }
    };

    if !framer.pending().is_empty() {
        tracing::debug!(bytes = framer.pending().len(), "discarding partial line");
    }
    drop(reader);

    state.send_replace(ConnectionState::Disconnected);
    let _ = events.send(SessionEvent::Disconnected { reason });
}

/// Parse one line and publish it. Returns `false` once nobody is listening.
fn dispatch_line(line: &str, events: &mpsc::UnboundedSender<SessionEvent>) -> bool {
    let parsed = parse_line(line);
    let event = match parsed.readings() {
        Some(readings) => {
            tracing::trace!(format = parsed.format_name(), "parsed line {:?}", line);
            SessionEvent::Reading(readings)
        }
        None => {
            tracing::debug!("could not parse UART data: {:?}", line);
            SessionEvent::Unparsed(line.to_string())
        }
    };
    events.send(event).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::Readings;
    use std::io::Cursor;

    async fn run_to_end(input: &'static [u8]) -> (Vec<SessionEvent>, ConnectionState) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ConnectionState::Connected);
        let state = Arc::new(state_tx);
        let (_cancel_tx, cancel_rx) = oneshot::channel();

        read_loop(Cursor::new(input), tx, state.clone(), cancel_rx).await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        let final_state = state.borrow().clone();
        (events, final_state)
    }

    #[tokio::test]
    async fn test_lines_are_published_in_order() {
        let (events, state) = run_to_end(b"10,20,30\nnoise\n40,50,60\n").await;

        assert_eq!(
            events,
            vec![
                SessionEvent::Reading(Readings::new(10.0, 20.0, 30.0)),
                SessionEvent::Unparsed("noise".to_string()),
                SessionEvent::Reading(Readings::new(40.0, 50.0, 60.0)),
                SessionEvent::Disconnected {
                    reason: DisconnectReason::Lost
                },
            ]
        );
        assert_eq!(state, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_trailing_partial_line_is_not_published() {
        let (events, _) = run_to_end(b"GAS=1\nGAS=2").await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], SessionEvent::Reading(Readings::new(1.0, 0.0, 0.0)));
    }

    #[tokio::test]
    async fn test_cancel_stops_loop_with_closed_reason() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ConnectionState::Connected);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        // Device end that never produces data
        let (device, _host) = tokio::io::duplex(64);
        let task = tokio::spawn(read_loop(device, tx, Arc::new(state_tx), cancel_rx));

        cancel_tx.send(()).unwrap();
        task.await.unwrap();

        assert_eq!(
            rx.recv().await,
            Some(SessionEvent::Disconnected {
                reason: DisconnectReason::Closed
            })
        );
    }
}
