//! Time sources for stamping incoming messages
//!
//! Every [`RawMessage`](crate::events::RawMessage) carries the time it was
//! received. The rate limiter compares these stamps, so the pipeline never
//! reads a clock itself - whoever produces messages owns the clock:
//! - System clock (wall clock, std only)
//! - Fixed/manual clock (tests and replay)

use core::sync::atomic::{AtomicU64, Ordering};

/// Timestamp in milliseconds since epoch (or an arbitrary origin for test clocks)
pub type Timestamp = u64;

/// Source of time for the system
pub trait TimeSource: Send + Sync {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// System time source (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTime;

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Manually driven time source for testing and replay
///
/// Shared by reference between a message producer and the test driving it,
/// so setting and advancing only need `&self`.
#[derive(Debug, Default)]
pub struct FixedTime {
    timestamp: AtomicU64,
}

impl FixedTime {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            timestamp: AtomicU64::new(timestamp),
        }
    }

    pub fn set(&self, timestamp: Timestamp) {
        self.timestamp.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.timestamp.fetch_add(ms, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp.load(Ordering::SeqCst)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for alloc::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
