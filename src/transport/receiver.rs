//! Cooperative receive loop with cancellation.
//!
//! One thread per connection reads packets while the owner keeps writing on
//! its own handle. The owner stops the reader with a [`CancellationToken`]
//! and waits for it to finish before tearing the transport down:
//!
//! ```text
//! owner                         receiver thread
//!  |  spawn_receiver ---------->  loop {
//!  |  send / send / ...             check token
//!  |  shutdown():                   read_packet (bounded by read deadline)
//!  |    token.cancel() ---------->  timeout -> check token -> exit
//!  |    join() <------------------  return report
//!  |  close()
//! ```

use std::io::Read;
use std::ops::ControlFlow;
use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};

use crate::protocol::{Packet, Result};

use super::stream::PacketStream;

/// Shared flag a receive loop polls between frames.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Summary returned by a receive loop that stopped cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverReport {
    /// Packets handed to the handler.
    pub packets: u64,
    /// Read deadlines that expired while waiting.
    pub timeouts: u64,
}

/// Handle to a running receive loop.
///
/// Dropping the handle without joining cancels the loop and detaches it.
#[derive(Debug)]
pub struct Receiver {
    token: CancellationToken,
    handle: Option<JoinHandle<Result<ReceiverReport>>>,
}

impl Receiver {
    /// Token observed by the loop.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether the loop has already exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel the loop and wait until it has stopped touching the transport.
    ///
    /// Returns within roughly one read deadline of the call.
    pub fn shutdown(self) -> Result<ReceiverReport> {
        self.token.cancel();
        self.join()
    }

    /// Wait for the loop to exit on its own.
    ///
    /// A panic inside the handler is resumed on the calling thread.
    pub fn join(mut self) -> Result<ReceiverReport> {
        let Some(handle) = self.handle.take() else {
            return Ok(ReceiverReport::default());
        };
        match handle.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.token.cancel();
        }
    }
}

/// Spawn a thread that reads packets from `stream` and passes each one to
/// `handler` until the token is cancelled, the handler breaks, or a
/// non-timeout error occurs.
///
/// The stream should carry a read deadline; without one, cancellation is
/// only noticed when the next frame arrives.
pub fn spawn_receiver<S, F>(
    stream: PacketStream<S>,
    token: CancellationToken,
    handler: F,
) -> Result<Receiver>
where
    S: Read + Send + 'static,
    F: FnMut(Packet) -> ControlFlow<()> + Send + 'static,
{
    let loop_token = token.clone();
    let handle = thread::Builder::new()
        .name("framewire-receiver".into())
        .spawn(move || receive_loop(stream, &loop_token, handler))?;

    Ok(Receiver {
        token,
        handle: Some(handle),
    })
}

fn receive_loop<S, F>(
    mut stream: PacketStream<S>,
    token: &CancellationToken,
    mut handler: F,
) -> Result<ReceiverReport>
where
    S: Read,
    F: FnMut(Packet) -> ControlFlow<()>,
{
    let mut report = ReceiverReport::default();

    while !token.is_cancelled() {
        match stream.read_packet() {
            Ok(packet) => {
                report.packets += 1;
                if handler(packet).is_break() {
                    debug!(packets = report.packets, "receiver stopped by handler");
                    return Ok(report);
                }
            }
            Err(err) if err.is_timeout() => {
                report.timeouts += 1;
                trace!("read deadline expired; checking cancellation");
            }
            Err(err) => {
                debug!(error = %err, packets = report.packets, "receiver stopped on error");
                return Err(err);
            }
        }
    }

    debug!(
        packets = report.packets,
        timeouts = report.timeouts,
        "receiver cancelled"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Error, Submit, SubmitAck};
    use std::io::{self, Cursor};
    use std::sync::mpsc;

    /// Source that always reports an expired deadline.
    struct AlwaysTimeout;

    impl Read for AlwaysTimeout {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            thread::sleep(std::time::Duration::from_millis(5));
            Err(io::Error::from(io::ErrorKind::WouldBlock))
        }
    }

    fn wire(packets: &[Packet]) -> Vec<u8> {
        let mut writer = PacketStream::new(Vec::new());
        for packet in packets {
            writer.write_packet(packet).unwrap();
        }
        writer.into_inner()
    }

    #[test]
    fn test_token_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_handler_receives_packets_until_break() {
        let data = wire(&[
            Packet::SubmitAck(SubmitAck::new("00000001", 0)),
            Packet::SubmitAck(SubmitAck::new("00000002", 1)),
            Packet::SubmitAck(SubmitAck::new("00000003", 2)),
        ]);
        let (tx, rx) = mpsc::channel();
        let receiver = spawn_receiver(
            PacketStream::new(Cursor::new(data)),
            CancellationToken::new(),
            move |packet| {
                let ack = *packet.as_submit_ack().unwrap();
                tx.send(ack.result).unwrap();
                if ack.result == 1 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        )
        .unwrap();

        let report = receiver.join().unwrap();
        assert_eq!(report.packets, 2);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_end_of_stream_is_reported() {
        let data = wire(&[Packet::Submit(Submit::new("00000001", b"x".to_vec()))]);
        let receiver = spawn_receiver(
            PacketStream::new(Cursor::new(data)),
            CancellationToken::new(),
            |_| ControlFlow::Continue(()),
        )
        .unwrap();

        let err = receiver.join().unwrap_err();
        assert!(err.is_disconnect());
    }

    #[test]
    fn test_shutdown_stops_idle_loop() {
        let receiver = spawn_receiver(
            PacketStream::new(AlwaysTimeout),
            CancellationToken::new(),
            |_| ControlFlow::Continue(()),
        )
        .unwrap();

        thread::sleep(std::time::Duration::from_millis(30));
        assert!(!receiver.is_finished());

        let report = receiver.shutdown().unwrap();
        assert_eq!(report.packets, 0);
        assert!(report.timeouts > 0);
    }

    #[test]
    fn test_pre_cancelled_token_never_reads() {
        let token = CancellationToken::new();
        token.cancel();
        let receiver = spawn_receiver(
            PacketStream::new(Cursor::new(vec![0u8, 0, 0, 1])),
            token,
            |_| ControlFlow::Continue(()),
        )
        .unwrap();

        assert_eq!(receiver.join().unwrap(), ReceiverReport::default());
    }

    #[test]
    fn test_protocol_error_stops_loop() {
        let receiver = spawn_receiver(
            PacketStream::new(Cursor::new(vec![0u8, 0, 0, 1])),
            CancellationToken::new(),
            |_| ControlFlow::Continue(()),
        )
        .unwrap();

        assert!(matches!(
            receiver.join(),
            Err(Error::MalformedLength { length: 1 })
        ));
    }
}
