//! Framewire error types

use std::io;

use thiserror::Error;

use super::CommandId;

/// Protocol errors raised by the frame codec and packet registry
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failed before any byte of a frame was consumed
    ///
    /// Read deadlines surface here, so callers can tell "nothing arrived yet"
    /// apart from a broken frame with [`Error::is_timeout`].
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The 4-byte length field could not be written
    #[error("failed to write frame header: {0}")]
    HeaderWrite(#[source] io::Error),

    /// The sink accepted fewer body bytes than the frame announced
    #[error("short write: wrote {written} of {expected} body bytes")]
    ShortWrite {
        /// Body length announced in the header
        expected: usize,
        /// Body bytes actually written
        written: usize,
        /// Kind of the I/O error that stopped the write, if the sink reported one
        cause: Option<io::ErrorKind>,
    },

    /// The stream ended before the frame was complete
    #[error("short read: got {got} of {expected} bytes")]
    ShortRead {
        /// Bytes required to finish the current frame section
        expected: usize,
        /// Bytes obtained before end of stream
        got: usize,
    },

    /// The transport failed after part of a frame had been consumed
    #[error("read aborted after {got} of {expected} bytes: {source}")]
    ReadAborted {
        /// Bytes required to finish the current frame section
        expected: usize,
        /// Bytes obtained before the failure
        got: usize,
        /// Underlying transport error
        #[source]
        source: io::Error,
    },

    /// Length field smaller than the length field itself
    #[error("malformed frame length: {length} (minimum 4)")]
    MalformedLength {
        /// Length value found on the wire
        length: u32,
    },

    /// Frame exceeds the configured maximum
    #[error("frame too large: {length} bytes (max {max})")]
    FrameTooLarge {
        /// Length value found on the wire
        length: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Message body carries no command byte
    #[error("empty message body")]
    EmptyBody,

    /// Message body too short for its declared variant
    #[error("truncated {command} body: need {needed} bytes, got {got}")]
    TruncatedBody {
        /// Variant being decoded
        command: CommandId,
        /// Minimum body size for the variant
        needed: usize,
        /// Actual body size
        got: usize,
    },

    /// Command byte outside the registered set
    #[error("unknown command id: {id:#04x}")]
    UnknownCommand {
        /// Command byte found on the wire
        id: u8,
    },

    /// Packet variant has no encoder
    #[error("unsupported packet variant for encoding: {command}")]
    UnsupportedVariant {
        /// Command of the rejected variant
        command: CommandId,
    },
}

impl Error {
    /// Whether this error is a read/write deadline expiring between frames.
    ///
    /// Only [`Error::Io`] qualifies: a deadline hit in the middle of a frame is
    /// reported as [`Error::ReadAborted`] because the stream lost alignment.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Io(err) if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
        )
    }

    /// Whether the peer went away cleanly at a frame boundary.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::Io(err) if matches!(
                err.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            )
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
