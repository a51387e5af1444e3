//! Framewire - length-prefixed framing and typed packets over reliable byte streams
//!
//! This library turns a byte stream (TCP, pipes, in-memory buffers) into
//! discrete frames and maps frame bodies to typed `Submit`/`SubmitAck`
//! packets keyed by a one-byte command id.
//!
//! # Quick Start
//!
//! ```rust
//! use std::io::Cursor;
//! use framewire::{FrameCodec, Packet, PacketRegistry, Submit};
//!
//! let codec = FrameCodec::new();
//! let registry = PacketRegistry::default();
//!
//! // Packet -> body -> frame
//! let packet = Packet::Submit(Submit::new("00000001", b"abcd".to_vec()));
//! let body = PacketRegistry::encode(&packet)?;
//! let mut wire = Vec::new();
//! codec.encode(&mut wire, &body)?;
//! assert_eq!(wire.len(), 17);
//!
//! // frame -> body -> Packet
//! let body = codec.decode(&mut Cursor::new(wire))?;
//! let decoded = registry.decode(&body)?;
//! assert_eq!(decoded, packet);
//! registry.release(decoded);
//! # Ok::<(), framewire::Error>(())
//! ```
//!
//! # Wire Format
//!
//! ```text
//! [LENGTH (4, BE) = body + 4] [COMMAND (1)] [ID (8)] [PAYLOAD | RESULT]
//! ```
//!
//! # Features
//!
//! - **Stateless codecs** - safe to call from any number of threads
//! - **Exhaustive dispatch** - packets are a sum type keyed by command id
//! - **Pooled decode path** - decoded submits come from a shared, injectable pool
//! - **Cancellable receive loop** - read deadlines plus a cancellation token

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;
pub mod transport;

pub use protocol::{
    CommandId, Error, FrameCodec, LENGTH_FIELD_SIZE, PACKET_ID_LEN, Packet, PacketId,
    PacketRegistry, Result, Submit, SubmitAck, SubmitPool,
};
pub use transport::{CancellationToken, Connection, ConnectionConfig, PacketStream};

/// Framewire crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default port used by the demo server and client
pub const DEFAULT_PORT: u16 = 8888;
