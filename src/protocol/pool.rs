//! Reusable `Submit` pool for the decode hot path.

use std::sync::{Arc, Mutex};

use tracing::warn;

use super::Submit;
use super::metrics::{Metrics, PoolEvent};

/// Payload capacity above which released submits give their buffer back to
/// the allocator instead of pinning it in the pool.
pub const MAX_RETAINED_PAYLOAD: usize = 64 * 1024;

/// Default number of idle submits kept around.
pub const DEFAULT_MAX_IDLE: usize = 256;

/// Shared pool of reusable [`Submit`] values.
///
/// Cloning is cheap and every clone shares the same free list, so one pool
/// can serve decoders on many connections at once.
///
/// # Reset contract
///
/// [`SubmitPool::release`] resets the value before storing it: the id is
/// zeroed and the payload is cleared. Values returned by
/// [`SubmitPool::acquire`] are therefore always equal to `Submit::default()`,
/// with possibly some spare payload capacity. A released value must not be
/// used by the caller afterwards; ownership makes that a compile error.
#[derive(Clone, Debug)]
pub struct SubmitPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    idle: Mutex<Vec<Submit>>,
    max_idle: usize,
}

impl SubmitPool {
    /// Create a pool that keeps at most `max_idle` released values.
    #[must_use]
    pub fn new(max_idle: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(Vec::with_capacity(max_idle)),
                max_idle,
            }),
        }
    }

    /// Create a pool that never retains anything: every acquire allocates
    /// and every release drops.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0)
    }

    /// Take a submit from the pool, allocating if none is idle.
    #[must_use]
    pub fn acquire(&self) -> Submit {
        let reused = match self.inner.idle.lock() {
            Ok(mut idle) => idle.pop(),
            Err(_) => {
                warn!("submit pool mutex poisoned; allocating");
                None
            }
        };

        match reused {
            Some(submit) => {
                Metrics::record_pool(PoolEvent::Hit);
                submit
            }
            None => {
                Metrics::record_pool(PoolEvent::Miss);
                Submit::default()
            }
        }
    }

    /// Reset `submit` and hand it back for reuse.
    pub fn release(&self, mut submit: Submit) {
        if self.inner.max_idle == 0 {
            return;
        }

        submit.reset();
        if submit.payload.capacity() > MAX_RETAINED_PAYLOAD {
            submit.payload = Vec::new();
        }

        if let Ok(mut idle) = self.inner.idle.lock() {
            if idle.len() < self.inner.max_idle {
                idle.push(submit);
                return;
            }
        }
        Metrics::record_pool(PoolEvent::Discard);
    }

    /// Number of idle submits ready for reuse.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.inner.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    /// Maximum number of idle submits kept.
    #[must_use]
    pub fn max_idle(&self) -> usize {
        self.inner.max_idle
    }
}

impl Default for SubmitPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IDLE)
    }
}
