//! Monotonic moment id allocation.
//!
//! # Responsibility
//! - Hand out one fresh `MomentId` per create call.
//!
//! # Invariants
//! - Every issued id is strictly greater than every id issued or observed
//!   before it, even when the wall clock stalls or moves backwards.
//! - Same-millisecond requests are separated by a 4-digit tie-breaker; when
//!   that runs out the allocator borrows the next millisecond.

use crate::model::moment_id::{MomentId, MAX_SEQUENCE};
use crate::store::{StoreError, StoreResult};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of epoch-millisecond time.
pub trait Clock: Send + Sync {
    /// Returns `None` when the clock cannot be read as epoch milliseconds.
    fn now_ms(&self) -> Option<i64>;
}

/// Wall clock backed by `SystemTime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Option<i64> {
        let elapsed = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
        i64::try_from(elapsed.as_millis()).ok()
    }
}

/// Issues strictly increasing ids.
pub struct IdAllocator {
    clock: Arc<dyn Clock>,
    last: Option<(i64, u32)>,
}

impl IdAllocator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, last: None }
    }

    /// Allocator using the system wall clock.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Raises the floor so the next id sorts after `id`.
    pub fn observe(&mut self, id: &MomentId) {
        let seen = (id.timestamp_ms(), id.sequence());
        if self.last.map_or(true, |last| seen > last) {
            self.last = Some(seen);
        }
    }

    /// Returns a fresh id.
    ///
    /// # Errors
    /// - `AllocationExhausted` when the clock is unreadable or the timestamp
    ///   no longer fits the 13-digit id prefix.
    pub fn next(&mut self) -> StoreResult<MomentId> {
        let now = self
            .clock
            .now_ms()
            .ok_or(StoreError::AllocationExhausted)?;

        // Why: a clock that steps backwards keeps counting from the last id,
        // so string order stays creation order.
        let (timestamp, sequence) = match self.last {
            Some((last_ts, last_seq)) if now <= last_ts => {
                if last_seq < u32::from(MAX_SEQUENCE) {
                    (last_ts, last_seq + 1)
                } else {
                    (last_ts + 1, 0)
                }
            }
            _ => (now, 0),
        };

        let id = MomentId::from_parts(timestamp, sequence)
            .map_err(|_| StoreError::AllocationExhausted)?;
        self.last = Some((timestamp, sequence));
        Ok(id)
    }
}
