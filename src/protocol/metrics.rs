use std::sync::atomic::{AtomicU64, Ordering};

use super::CommandId;

/// Track framewire protocol metrics without external dependencies.
pub(crate) struct Metrics;

static FRAMES_SENT: AtomicU64 = AtomicU64::new(0);
static FRAMES_RECEIVED: AtomicU64 = AtomicU64::new(0);
static BYTES_SENT: AtomicU64 = AtomicU64::new(0);
static BYTES_RECEIVED: AtomicU64 = AtomicU64::new(0);
static PACKETS_SENT: AtomicU64 = AtomicU64::new(0);
static PACKETS_RECEIVED: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static TIMEOUT_COUNT: AtomicU64 = AtomicU64::new(0);
static ACTIVE_CONNECTIONS: AtomicU64 = AtomicU64::new(0);
static POOL_HITS: AtomicU64 = AtomicU64::new(0);
static POOL_MISSES: AtomicU64 = AtomicU64::new(0);
static POOL_DISCARDS: AtomicU64 = AtomicU64::new(0);

struct CommandCounters {
    conn: AtomicU64,
    submit: AtomicU64,
    conn_ack: AtomicU64,
    submit_ack: AtomicU64,
}

static COMMAND_COUNTERS: CommandCounters = CommandCounters::new();

impl CommandCounters {
    const fn new() -> Self {
        Self {
            conn: AtomicU64::new(0),
            submit: AtomicU64::new(0),
            conn_ack: AtomicU64::new(0),
            submit_ack: AtomicU64::new(0),
        }
    }

    fn increment(&self, command: CommandId) {
        let counter = match command {
            CommandId::Conn => &self.conn,
            CommandId::Submit => &self.submit,
            CommandId::ConnAck => &self.conn_ack,
            CommandId::SubmitAck => &self.submit_ack,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Direction of message flow for counting.
#[derive(Clone, Copy)]
pub(crate) enum MessageDirection {
    Sent,
    Received,
}

/// Outcome of a pool operation.
#[derive(Clone, Copy)]
pub(crate) enum PoolEvent {
    Hit,
    Miss,
    Discard,
}

impl Metrics {
    #[inline]
    pub(crate) fn record_frame(direction: MessageDirection, bytes: usize) {
        let bytes = bytes as u64;
        match direction {
            MessageDirection::Sent => {
                FRAMES_SENT.fetch_add(1, Ordering::Relaxed);
                BYTES_SENT.fetch_add(bytes, Ordering::Relaxed);
            }
            MessageDirection::Received => {
                FRAMES_RECEIVED.fetch_add(1, Ordering::Relaxed);
                BYTES_RECEIVED.fetch_add(bytes, Ordering::Relaxed);
            }
        }
    }

    #[inline]
    pub(crate) fn record_packet(direction: MessageDirection, command: CommandId) {
        match direction {
            MessageDirection::Sent => {
                PACKETS_SENT.fetch_add(1, Ordering::Relaxed);
            }
            MessageDirection::Received => {
                PACKETS_RECEIVED.fetch_add(1, Ordering::Relaxed);
            }
        }
        COMMAND_COUNTERS.increment(command);
    }

    #[inline]
    pub(crate) fn record_error() {
        ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_timeout() {
        TIMEOUT_COUNT.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_connection_open() {
        ACTIVE_CONNECTIONS.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_connection_close() {
        ACTIVE_CONNECTIONS.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_pool(event: PoolEvent) {
        let counter = match event {
            PoolEvent::Hit => &POOL_HITS,
            PoolEvent::Miss => &POOL_MISSES,
            PoolEvent::Discard => &POOL_DISCARDS,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn totals() -> MetricsSnapshot {
        MetricsSnapshot {
            frames_sent: FRAMES_SENT.load(Ordering::Relaxed),
            frames_received: FRAMES_RECEIVED.load(Ordering::Relaxed),
            bytes_sent: BYTES_SENT.load(Ordering::Relaxed),
            bytes_received: BYTES_RECEIVED.load(Ordering::Relaxed),
            packets_sent: PACKETS_SENT.load(Ordering::Relaxed),
            packets_received: PACKETS_RECEIVED.load(Ordering::Relaxed),
            submits: COMMAND_COUNTERS.submit.load(Ordering::Relaxed),
            submit_acks: COMMAND_COUNTERS.submit_ack.load(Ordering::Relaxed),
            reserved_commands: COMMAND_COUNTERS.conn.load(Ordering::Relaxed)
                + COMMAND_COUNTERS.conn_ack.load(Ordering::Relaxed),
            total_errors: ERROR_COUNT.load(Ordering::Relaxed),
            timeouts: TIMEOUT_COUNT.load(Ordering::Relaxed),
            active_connections: ACTIVE_CONNECTIONS.load(Ordering::Relaxed),
            pool_hits: POOL_HITS.load(Ordering::Relaxed),
            pool_misses: POOL_MISSES.load(Ordering::Relaxed),
            pool_discards: POOL_DISCARDS.load(Ordering::Relaxed),
        }
    }
}

/// Lightweight snapshot of the process-wide counters.
#[derive(Default, Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    /// Frames written by the codec
    pub frames_sent: u64,
    /// Frames read by the codec
    pub frames_received: u64,
    /// Wire bytes written, length fields included
    pub bytes_sent: u64,
    /// Wire bytes read, length fields included
    pub bytes_received: u64,
    /// Packets encoded by the registry
    pub packets_sent: u64,
    /// Packets decoded by the registry
    pub packets_received: u64,
    /// `Submit` packets seen in either direction
    pub submits: u64,
    /// `SubmitAck` packets seen in either direction
    pub submit_acks: u64,
    /// `Conn`/`ConnAck` stubs decoded
    pub reserved_commands: u64,
    /// Codec and registry failures
    pub total_errors: u64,
    /// Read deadlines that expired between frames
    pub timeouts: u64,
    /// Open connections
    pub active_connections: u64,
    /// Pool acquires served from the free list
    pub pool_hits: u64,
    /// Pool acquires that had to allocate
    pub pool_misses: u64,
    /// Released submits dropped because the pool was full
    pub pool_discards: u64,
}

impl MetricsSnapshot {
    /// Fraction of pool acquires served without allocating.
    #[must_use]
    pub fn pool_hit_ratio(&self) -> Option<f64> {
        let total = self.pool_hits + self.pool_misses;
        if total == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.pool_hits as f64 / total as f64)
    }
}
