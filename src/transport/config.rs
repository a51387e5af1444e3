//! Connection configuration.

use std::time::Duration;

use crate::protocol::{FrameCodec, SubmitPool};

/// Connection configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectionConfig {
    /// Read deadline applied to the socket; bounds how long a receive loop
    /// takes to notice cancellation. `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Optional write timeout for the socket.
    pub write_timeout: Option<Duration>,
    /// Optional upper bound on a frame's total length, header included.
    pub max_frame_len: Option<usize>,
    /// Disable Nagle's algorithm on TCP connections.
    pub nodelay: bool,
}

impl ConnectionConfig {
    /// Set the read deadline.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the write timeout.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the frame size limit.
    #[must_use]
    pub fn with_max_frame_len(mut self, max: Option<usize>) -> Self {
        self.max_frame_len = max;
        self
    }

    /// Toggle `TCP_NODELAY`.
    #[must_use]
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Frame codec matching this configuration.
    #[must_use]
    pub fn codec(&self) -> FrameCodec {
        match self.max_frame_len {
            Some(max) => FrameCodec::new().with_max_frame_len(max),
            None => FrameCodec::new(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_timeout: Some(Duration::from_secs(1)),
            write_timeout: None,
            max_frame_len: None,
            nodelay: true,
        }
    }
}

/// Pool shared by every connection that does not bring its own.
#[must_use]
pub fn default_pool() -> SubmitPool {
    use std::sync::OnceLock;

    static POOL: OnceLock<SubmitPool> = OnceLock::new();
    POOL.get_or_init(SubmitPool::default).clone()
}
