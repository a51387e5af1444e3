//! Packet-level reader/writer over any byte stream.

use std::io::{Read, Write};

use tracing::instrument;

use crate::protocol::{Error, FrameCodec, Packet, PacketRegistry, Result};

use super::config::default_pool;

/// Wraps a byte stream and speaks packets over it.
///
/// Reading needs `S: Read`, writing needs `S: Write`; a duplex transport is
/// usually split into two `PacketStream`s over cloned handles so one thread
/// reads while another writes.
#[derive(Debug)]
pub struct PacketStream<S> {
    inner: S,
    codec: FrameCodec,
    registry: PacketRegistry,
    encode_buffer: Vec<u8>,
}

impl<S> PacketStream<S> {
    /// Wrap `inner` with an unbounded codec and the process-wide submit pool.
    pub fn new(inner: S) -> Self {
        Self::with_parts(inner, FrameCodec::new(), PacketRegistry::new(default_pool()))
    }

    /// Wrap `inner` with an explicit codec and registry.
    pub fn with_parts(inner: S, codec: FrameCodec, registry: PacketRegistry) -> Self {
        Self {
            inner,
            codec,
            registry,
            encode_buffer: Vec::with_capacity(256),
        }
    }

    /// Frame codec in use.
    #[must_use]
    pub fn codec(&self) -> FrameCodec {
        self.codec
    }

    /// Registry in use; release consumed submits through it.
    #[must_use]
    pub fn registry(&self) -> &PacketRegistry {
        &self.registry
    }

    /// Access the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Access the underlying stream mutably.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwrap and return the underlying stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: Read> PacketStream<S> {
    /// Read one packet, blocking until a whole frame arrives.
    ///
    /// # Errors
    ///
    /// Any frame or registry error; check [`Error::is_timeout`] to tell an
    /// expired read deadline from a broken stream.
    #[instrument(level = "trace", skip(self))]
    pub fn read_packet(&mut self) -> Result<Packet> {
        let body = self.codec.decode(&mut self.inner)?;
        self.registry.decode(&body)
    }

    /// Read one packet, mapping an expired read deadline to `Ok(None)`.
    pub fn poll_packet(&mut self) -> Result<Option<Packet>> {
        match self.read_packet() {
            Ok(packet) => Ok(Some(packet)),
            Err(err) if err.is_timeout() => Ok(None),
            Err(err) => Err(err),
        }
    }
}

impl<S: Write> PacketStream<S> {
    /// Encode `packet` and write it as a single frame.
    ///
    /// Returns the number of bytes placed on the wire.
    #[instrument(level = "trace", skip(self, packet), fields(command = %packet.command()))]
    pub fn write_packet(&mut self, packet: &Packet) -> Result<usize> {
        self.encode_buffer.clear();
        PacketRegistry::encode_into(packet, &mut self.encode_buffer)?;
        self.codec.encode(&mut self.inner, &self.encode_buffer)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().map_err(Error::Io)
    }
}
