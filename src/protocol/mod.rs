//! Framewire protocol core implementation
//!
//! This module provides the frame codec, packet variants, packet registry,
//! and the submit object pool.

mod error;
mod frame;
pub(crate) mod metrics;
mod packet;
mod pool;
mod registry;
mod types;

pub use error::{Error, Result};
pub use frame::{FrameCodec, read_frame, write_frame};
pub use metrics::MetricsSnapshot;
pub use packet::{Packet, Submit, SubmitAck};
pub use pool::SubmitPool;
pub use registry::PacketRegistry;
pub use types::{CommandId, PACKET_ID_LEN, PacketId};

/// Size of the frame length field in bytes
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Size of the command byte leading every message body
pub const COMMAND_SIZE: usize = 1;

/// Minimum `Submit` body size (id only, empty payload)
pub const SUBMIT_MIN_BODY: usize = PACKET_ID_LEN;

/// `SubmitAck` body size (id + result byte)
pub const SUBMIT_ACK_BODY: usize = PACKET_ID_LEN + 1;

/// Snapshot the process-wide protocol counters
#[must_use]
pub fn metrics_snapshot() -> MetricsSnapshot {
    metrics::Metrics::totals()
}
