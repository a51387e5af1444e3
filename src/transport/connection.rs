//! TCP connection speaking framewire packets.

use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, instrument};

use crate::protocol::metrics::Metrics;
use crate::protocol::{Error, Packet, PacketRegistry, Result, SubmitPool};

use super::config::{ConnectionConfig, default_pool};
use super::stream::PacketStream;

/// Owning side of a TCP connection.
///
/// The owner writes packets and is responsible for teardown. A second
/// handle for a dedicated reader thread comes from
/// [`Connection::reader`]; stop that thread (see
/// [`crate::transport::Receiver::shutdown`]) before calling
/// [`Connection::close`].
#[derive(Debug)]
pub struct Connection {
    stream: PacketStream<TcpStream>,
    config: ConnectionConfig,
    peer: SocketAddr,
}

impl Connection {
    /// Connect to a remote address.
    #[instrument(level = "debug", skip(addr, config))]
    pub fn connect(addr: impl ToSocketAddrs, config: &ConnectionConfig) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Self::from_stream(stream, config)
    }

    /// Accept the next connection from `listener`.
    pub fn accept(listener: &TcpListener, config: &ConnectionConfig) -> Result<Self> {
        let (stream, _) = listener.accept()?;
        Self::from_stream(stream, config)
    }

    /// Adopt an established stream, applying the configured socket options.
    pub fn from_stream(stream: TcpStream, config: &ConnectionConfig) -> Result<Self> {
        Self::with_pool(stream, config, default_pool())
    }

    /// Adopt an established stream, drawing decoded submits from `pool`.
    pub fn with_pool(stream: TcpStream, config: &ConnectionConfig, pool: SubmitPool) -> Result<Self> {
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        stream.set_nodelay(config.nodelay)?;
        let peer = stream.peer_addr()?;

        Metrics::record_connection_open();
        debug!(%peer, "connection established");

        Ok(Self {
            stream: PacketStream::with_parts(stream, config.codec(), PacketRegistry::new(pool)),
            config: config.clone(),
            peer,
        })
    }

    /// Clone the socket into an independent packet reader.
    ///
    /// Both handles share the socket and its read deadline.
    pub fn reader(&self) -> Result<PacketStream<TcpStream>> {
        let clone = self.stream.get_ref().try_clone()?;
        Ok(PacketStream::with_parts(
            clone,
            self.stream.codec(),
            self.stream.registry().clone(),
        ))
    }

    /// Send one packet.
    pub fn send(&mut self, packet: &Packet) -> Result<usize> {
        self.stream.write_packet(packet)
    }

    /// Receive one packet, blocking up to the read deadline.
    pub fn recv(&mut self) -> Result<Packet> {
        self.stream.read_packet()
    }

    /// Receive one packet, mapping an expired read deadline to `Ok(None)`.
    pub fn poll(&mut self) -> Result<Option<Packet>> {
        self.stream.poll_packet()
    }

    /// Registry used by this connection.
    #[must_use]
    pub fn registry(&self) -> &PacketRegistry {
        self.stream.registry()
    }

    /// Remote address.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.stream.get_ref().local_addr().map_err(Error::Io)
    }

    /// Configuration the connection was built with.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Shut down both directions of the socket.
    ///
    /// Any cloned reader observes end of stream afterwards.
    #[instrument(level = "debug", skip(self), fields(peer = %self.peer))]
    pub fn close(self) -> Result<()> {
        match self.stream.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // Peer already gone.
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(Error::Io(err)),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!(peer = %self.peer, "connection dropped; metrics connection close");
        Metrics::record_connection_close();
    }
}
