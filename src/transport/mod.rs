//! Framewire transport plumbing over blocking byte streams
//!
//! Thin wrappers that feed the protocol core: a packet reader/writer over any
//! `Read`/`Write`, a TCP connection with read deadlines, and a cancellable
//! receive loop. No protocol logic lives here.

mod config;
mod connection;
mod receiver;
mod stream;

pub use config::{ConnectionConfig, default_pool};
pub use connection::Connection;
pub use receiver::{CancellationToken, Receiver, ReceiverReport, spawn_receiver};
pub use stream::PacketStream;
