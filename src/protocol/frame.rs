//! Framewire frame codec (length-prefixed framing)
//!
//! This module turns an unbounded byte stream into discrete message bodies.

use std::io::{self, Read, Write};

use bytes::{Bytes, BytesMut};
use tracing::{instrument, trace};

use super::metrics::{Metrics, MessageDirection};
use super::{Error, LENGTH_FIELD_SIZE, Result};

/// Stateless codec for `[length (4, BE)] [body (length - 4)]` frames
///
/// # Format
///
/// ```text
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                  Total Length (4, big-endian)                 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                    Body (Total Length - 4)                  ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The length field counts itself. The codec never looks inside the body.
///
/// By default there is no upper bound on the announced length, so a corrupt
/// header can request an arbitrarily large allocation. Use
/// [`FrameCodec::with_max_frame_len`] on untrusted links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCodec {
    max_frame_len: Option<usize>,
}

impl FrameCodec {
    /// Create an unbounded codec
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_frame_len: None,
        }
    }

    /// Reject frames whose total length (header included) exceeds `max`
    #[must_use]
    pub const fn with_max_frame_len(mut self, max: usize) -> Self {
        self.max_frame_len = Some(max);
        self
    }

    /// Configured frame size limit, if any
    #[must_use]
    pub const fn max_frame_len(&self) -> Option<usize> {
        self.max_frame_len
    }

    /// Write one frame carrying `body` to `sink`
    ///
    /// Returns the number of bytes placed on the wire (`body.len() + 4`).
    ///
    /// # Errors
    ///
    /// - [`Error::HeaderWrite`] if the length field cannot be written
    /// - [`Error::ShortWrite`] if the sink takes fewer body bytes than announced
    /// - [`Error::FrameTooLarge`] if the body does not fit the length field or
    ///   the configured limit
    #[instrument(level = "trace", skip(self, sink, body), fields(len = body.len()))]
    pub fn encode<W: Write + ?Sized>(&self, sink: &mut W, body: &[u8]) -> Result<usize> {
        let total_len = body.len() + LENGTH_FIELD_SIZE;
        let max = self.max_frame_len.unwrap_or(u32::MAX as usize).min(u32::MAX as usize);
        if total_len > max {
            return Err(Error::FrameTooLarge {
                length: total_len,
                max,
            });
        }

        #[allow(clippy::cast_possible_truncation)]
        let header = (total_len as u32).to_be_bytes();
        sink.write_all(&header).map_err(Error::HeaderWrite)?;

        let written = write_counted(sink, body);
        match written {
            (n, None) if n == body.len() => {}
            (written, cause) => {
                Metrics::record_error();
                return Err(Error::ShortWrite {
                    expected: body.len(),
                    written,
                    cause: cause.map(|err| err.kind()),
                });
            }
        }

        Metrics::record_frame(MessageDirection::Sent, total_len);
        trace!(total_len, "frame written");
        Ok(total_len)
    }

    /// Read exactly one frame from `stream` and return its body
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the stream fails (or ends) before any byte of the
    ///   frame was consumed; read deadlines land here
    /// - [`Error::ShortRead`] if the stream ends in the middle of the frame
    /// - [`Error::ReadAborted`] if the stream fails in the middle of the frame
    /// - [`Error::MalformedLength`] if the length field is below 4
    /// - [`Error::FrameTooLarge`] if the configured limit is exceeded
    #[instrument(level = "trace", skip(self, stream))]
    pub fn decode<R: Read + ?Sized>(&self, stream: &mut R) -> Result<Bytes> {
        let mut header = [0u8; LENGTH_FIELD_SIZE];
        match read_counted(stream, &mut header) {
            (LENGTH_FIELD_SIZE, None) => {}
            (0, Some(err)) => {
                if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) {
                    Metrics::record_timeout();
                }
                return Err(Error::Io(err));
            }
            (0, None) => {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream closed at frame boundary",
                )));
            }
            (got, cause) => {
                Metrics::record_error();
                return Err(incomplete(LENGTH_FIELD_SIZE, got, cause));
            }
        }

        let length = u32::from_be_bytes(header);
        if (length as usize) < LENGTH_FIELD_SIZE {
            Metrics::record_error();
            return Err(Error::MalformedLength { length });
        }
        if let Some(max) = self.max_frame_len {
            if length as usize > max {
                Metrics::record_error();
                return Err(Error::FrameTooLarge {
                    length: length as usize,
                    max,
                });
            }
        }

        let body_len = length as usize - LENGTH_FIELD_SIZE;
        let mut body = BytesMut::zeroed(body_len);
        match read_counted(stream, &mut body) {
            (n, None) if n == body_len => {}
            (got, cause) => {
                Metrics::record_error();
                return Err(incomplete(body_len, got, cause));
            }
        }

        Metrics::record_frame(MessageDirection::Received, length as usize);
        trace!(length, "frame read");
        Ok(body.freeze())
    }
}

/// Write one frame with the default (unbounded) codec
pub fn write_frame<W: Write + ?Sized>(sink: &mut W, body: &[u8]) -> Result<usize> {
    FrameCodec::new().encode(sink, body)
}

/// Read one frame with the default (unbounded) codec
pub fn read_frame<R: Read + ?Sized>(stream: &mut R) -> Result<Bytes> {
    FrameCodec::new().decode(stream)
}

fn incomplete(expected: usize, got: usize, cause: Option<io::Error>) -> Error {
    match cause {
        Some(source) => Error::ReadAborted {
            expected,
            got,
            source,
        },
        None => Error::ShortRead { expected, got },
    }
}

/// Fill `buf`, retrying `Interrupted`. Stops at end of stream or the first
/// other error and reports how far it got.
fn read_counted<R: Read + ?Sized>(stream: &mut R, buf: &mut [u8]) -> (usize, Option<io::Error>) {
    let mut filled = 0;
    while filled < buf.len() {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return (filled, Some(err)),
        }
    }
    (filled, None)
}

/// Push all of `buf` into `sink`, retrying `Interrupted`. Stops when the sink
/// accepts zero bytes or errors and reports how far it got.
fn write_counted<W: Write + ?Sized>(sink: &mut W, buf: &[u8]) -> (usize, Option<io::Error>) {
    let mut written = 0;
    while written < buf.len() {
        match sink.write(&buf[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return (written, Some(err)),
        }
    }
    (written, None)
}
