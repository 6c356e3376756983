//! Clock abstraction
//!
//! Time is injected at construction and threaded through every
//! time-dependent call; there is no process-wide clock state. Production
//! code uses [`SystemClock`]; tests drive a [`ManualClock`] to get
//! deterministic window movement.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::types::TimestampMs;

/// Source of the current instant
pub trait Clock: Send + Sync {
    /// Current instant in milliseconds since the Unix epoch
    fn now_ms(&self) -> TimestampMs;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> TimestampMs {
        (**self).now_ms()
    }
}

/// Wall clock backed by `chrono::Utc`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> TimestampMs {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Controllable clock for deterministic tests
///
/// Shared via `Arc`: hand one clone to the engine and keep another to move
/// time. The instant is stored atomically so readers never block.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rollwin::{Clock, ManualClock};
///
/// let clock = Arc::new(ManualClock::new(1_000));
/// assert_eq!(clock.now_ms(), 1_000);
/// clock.advance(500);
/// assert_eq!(clock.now_ms(), 1_500);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Create a clock pinned at `start`
    pub fn new(start: TimestampMs) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    /// Pin the clock to `instant`
    pub fn set(&self, instant: TimestampMs) {
        self.now.store(instant, Ordering::SeqCst);
    }

    /// Move the clock forward (or backward, for precondition tests) by `delta_ms`
    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> TimestampMs {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_set_and_advance() {
        let clock = ManualClock::new(0);
        assert_eq!(clock.now_ms(), 0);
        clock.set(-250);
        assert_eq!(clock.now_ms(), -250);
        clock.advance(1_000);
        assert_eq!(clock.now_ms(), 750);
    }

    #[test]
    fn arc_wrapped_clock_is_usable_as_clock() {
        let clock = Arc::new(ManualClock::new(7));
        fn read(c: &impl Clock) -> TimestampMs {
            c.now_ms()
        }
        assert_eq!(read(&clock), 7);
    }
}
