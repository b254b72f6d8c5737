//! Per-kind rate limiting
//!
//! Sound sensors publish far more often than a display can usefully show.
//! The limiter lets at most one Sound message through per interval (1 s by
//! default); every other kind passes untouched.
//!
//! ## Atomicity
//!
//! Messages may be handled concurrently on the transport's I/O threads, so
//! "has the interval elapsed? then record now" is a single compare-and-swap:
//!
//! ```text
//! load last ─→ elapsed < interval? ──yes──→ reject
//!    ↑                │ no
//!    │                ▼
//!    └──lost race── CAS(last → now) ──won──→ accept
//! ```
//!
//! A thread that loses the race re-reads the winner's timestamp and is then
//! rejected, so two messages inside one interval can never both pass.

use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;

use crate::events::SensorKind;
use crate::time::Timestamp;

/// Default minimum spacing between accepted Sound updates
pub const SOUND_INTERVAL: Duration = Duration::from_secs(1);

/// Stored value for "never accepted"
///
/// Accepted timestamps are stored plus one, so every real timestamp except
/// `u64::MAX` has a representation distinct from this marker.
const NEVER: u64 = 0;

/// Last-accepted time and minimum spacing for one rate-limited kind
#[derive(Debug)]
pub struct RateLimiterState {
    last_accepted: AtomicU64,
    interval_ms: u64,
}

impl RateLimiterState {
    pub fn new(interval: Duration) -> Self {
        Self {
            last_accepted: AtomicU64::new(NEVER),
            interval_ms: interval.as_millis() as u64,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Timestamp of the last accepted update, if any
    pub fn last_accepted(&self) -> Option<Timestamp> {
        match self.last_accepted.load(Ordering::Acquire) {
            NEVER => None,
            stored => Some(stored - 1),
        }
    }

    /// Accept `now` if the interval has elapsed since the last acceptance
    ///
    /// State is only written on acceptance. A timestamp earlier than the last
    /// accepted one is rejected, and so is `u64::MAX`, which cannot be stored.
    pub fn try_advance(&self, now: Timestamp) -> bool {
        let Some(stored) = now.checked_add(1) else {
            return false;
        };

        let mut last = self.last_accepted.load(Ordering::Acquire);
        loop {
            if last != NEVER {
                match stored.checked_sub(last) {
                    Some(elapsed) if elapsed >= self.interval_ms => {}
                    _ => return false,
                }
            }

            match self
                .last_accepted
                .compare_exchange_weak(last, stored, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(current) => last = current,
            }
        }
    }
}

/// Gates high-frequency sensor kinds
#[derive(Debug)]
pub struct RateLimiter {
    sound: RateLimiterState,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_interval(SOUND_INTERVAL)
    }

    /// Limit Sound to one update per `interval`
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            sound: RateLimiterState::new(interval),
        }
    }

    /// Decide whether a message of `kind` received at `now` may proceed
    pub fn try_accept(&self, kind: SensorKind, now: Timestamp) -> bool {
        match kind {
            SensorKind::Sound => self.sound.try_advance(now),
            _ => true,
        }
    }

    /// State for a rate-limited kind
    pub fn state(&self, kind: SensorKind) -> Option<&RateLimiterState> {
        match kind {
            SensorKind::Sound => Some(&self.sound),
            _ => None,
        }
    }
}
