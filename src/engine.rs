//! Sliding-window engine: the public orchestrator
//!
//! [`SlidingWindowEngine`] owns the bucket ledger and one "live" window
//! tracking the current instant. Adding an event merges it into its bucket
//! and into the live window, reconciles the live window to "now", then
//! evicts buckets past the retention horizon, all inside one critical
//! section, so readers never observe a window mid-reconciliation.
//!
//! Queries are snapshot-style: the current aggregate is cloned out of the
//! live window after reconciling it, and past-instant queries clone the
//! live window into a throwaway probe that is reconciled to the target
//! instant without touching the live state or the ledger.
//!
//! Every operation is synchronous and CPU-bound; maintenance (eviction,
//! reconciliation) happens lazily inside add/query calls, never on a
//! background thread.

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::aggregate::{Aggregate, MergeEvent};
use crate::bucket::bucket_key_of;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::ledger::BucketLedger;
use crate::types::{KeyRange, Timestamped, TimestampMs};
use crate::window::Window;

// ============================================================================
// Engine
// ============================================================================

/// Mutable state guarded by the engine's mutex
///
/// The triple moves together: the ledger and the live window reference each
/// other through bucket handles, and the last-event timestamp orders adds.
struct EngineState<A> {
    ledger: BucketLedger<A>,
    live: Window<A>,
    last_event_ts: Option<TimestampMs>,
}

/// Continuously updated aggregate over the trailing window of an event stream
///
/// Generic over the aggregate type `A` (the summary being maintained) and
/// the clock `C` (injected so tests control time). The aggregate's
/// `Default` impl is the factory for empty buckets and windows.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use rollwin::{DataPoint, EngineConfig, ManualClock, SlidingWindowEngine, VolumeAverage};
///
/// # fn main() -> rollwin::Result<()> {
/// let clock = Arc::new(ManualClock::new(0));
/// let engine: SlidingWindowEngine<VolumeAverage, _> =
///     SlidingWindowEngine::new(EngineConfig::new(500, 10), Arc::clone(&clock))?;
///
/// engine.add(&DataPoint::new(-20, 4.0))?;
/// engine.add(&DataPoint::new(0, 8.0))?;
///
/// let snapshot = engine.current();
/// assert_eq!(snapshot.count(), 2);
/// assert_eq!(snapshot.mean(), 6.0);
/// # Ok(())
/// # }
/// ```
pub struct SlidingWindowEngine<A, C = SystemClock> {
    config: EngineConfig,
    clock: C,
    state: Mutex<EngineState<A>>,
}

impl<A: Aggregate> SlidingWindowEngine<A, SystemClock> {
    /// Create an engine driven by the wall clock
    pub fn with_system_clock(config: EngineConfig) -> Result<Self> {
        Self::new(config, SystemClock)
    }
}

impl<A: Aggregate, C: Clock> SlidingWindowEngine<A, C> {
    /// Create an engine with an injected clock
    ///
    /// Fails with [`Error::Configuration`] if the window length or bucket
    /// interval is invalid; no partial engine is returned.
    pub fn new(config: EngineConfig, clock: C) -> Result<Self> {
        config.validate()?;
        debug!(
            window_ms = config.window_ms,
            bucket_interval_ms = config.bucket_interval_ms,
            "sliding window engine created"
        );
        Ok(Self {
            config,
            clock,
            state: Mutex::new(EngineState {
                ledger: BucketLedger::new(),
                live: Window::new(),
                last_event_ts: None,
            }),
        })
    }

    /// The validated configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Add one event to the stream
    ///
    /// Requires non-decreasing timestamps across calls; an older timestamp
    /// fails with [`Error::OutOfOrder`] and leaves the store unchanged.
    /// On success the event is merged into its bucket and the live window,
    /// the live window is reconciled to "now", and buckets past the
    /// retention horizon are evicted, all in one atomic critical section.
    pub fn add<E>(&self, event: &E) -> Result<()>
    where
        E: Timestamped,
        A: MergeEvent<E>,
    {
        let ts = event.timestamp_ms();
        let now = self.clock.now_ms();
        let target = self.window_range_for(now);
        let threshold = self
            .timestamp_key_of(now)
            .saturating_sub(self.config.internal_window_ms());

        let mut state = self.state.lock();
        if let Some(last) = state.last_event_ts {
            if ts < last {
                return Err(Error::OutOfOrder { last, offered: ts });
            }
        }

        let key = bucket_key_of(ts, self.config.bucket_interval_ms);
        let EngineState {
            ledger,
            live,
            last_event_ts,
        } = &mut *state;

        let seq = ledger.locate_or_create(key);
        if let Some(bucket) = ledger.bucket_mut(seq) {
            bucket.aggregate_mut().merge_event(event);
        }
        live.absorb(seq, event);
        live.reconcile(ledger, target);
        for (seq, bucket) in ledger.evict_older_than(threshold) {
            live.release(seq, &bucket);
        }
        *last_event_ts = Some(ts);
        trace!(ts, key, "event added");
        Ok(())
    }

    /// Aggregate over the trailing window ending at "now"
    ///
    /// Reconciles the live window to the current instant and returns a copy
    /// of its aggregate. With no intervening adds and an unchanged clock,
    /// repeated calls return identical results.
    pub fn current(&self) -> A {
        let now = self.clock.now_ms();
        let target = self.window_range_for(now);
        let mut state = self.state.lock();
        let EngineState { ledger, live, .. } = &mut *state;
        live.reconcile(ledger, target);
        live.aggregate().clone()
    }

    /// Aggregate over the trailing window ending at a past instant
    ///
    /// Fails with [`Error::HorizonExceeded`] when `instant` is more than one
    /// window length before "now", since older history is already partially
    /// evicted. Otherwise clones the live window into a probe, reconciles
    /// the probe to `instant`, and returns its aggregate; the live window
    /// and the ledger are left untouched.
    pub fn aggregate_as_of(&self, instant: TimestampMs) -> Result<A> {
        let now = self.clock.now_ms();
        if now.saturating_sub(instant) > self.config.window_ms {
            return Err(Error::HorizonExceeded {
                instant,
                horizon_ms: self.config.window_ms,
            });
        }
        let target = self.window_range_for(instant);
        let state = self.state.lock();
        let mut probe = state.live.clone();
        probe.reconcile(&state.ledger, target);
        trace!(instant, "past-instant aggregate computed");
        Ok(probe.into_aggregate())
    }

    /// Bucket key containing `instant`
    pub fn timestamp_key_of(&self, instant: TimestampMs) -> TimestampMs {
        bucket_key_of(instant, self.config.bucket_interval_ms)
    }

    /// Bucket key of the window start for a window ending at `end_instant`
    ///
    /// The end key is quantized first, the window length subtracted, and
    /// the result quantized again: the raw difference need not land on a
    /// bucket boundary when the window length is not a multiple of the
    /// bucket interval.
    pub fn window_start_key_for(&self, end_instant: TimestampMs) -> TimestampMs {
        let end_key = self.timestamp_key_of(end_instant);
        self.timestamp_key_of(end_key.saturating_sub(self.config.window_ms))
    }

    /// Bucket-key range covered by a window ending at `instant`
    pub fn window_range_for(&self, instant: TimestampMs) -> KeyRange {
        KeyRange::new(
            self.window_start_key_for(instant),
            self.timestamp_key_of(instant),
        )
    }

    /// Snapshot of the engine's retained state
    pub fn stats(&self) -> EngineStats {
        let state = self.state.lock();
        EngineStats {
            bucket_count: state.ledger.len(),
            oldest_key: state.ledger.oldest().map(|b| b.key()),
            newest_key: state.ledger.newest().map(|b| b.key()),
            last_event_ts: state.last_event_ts,
        }
    }
}

// ============================================================================
// Stats
// ============================================================================

/// Point-in-time snapshot of the ledger and add stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// Number of retained buckets
    pub bucket_count: usize,
    /// Key of the oldest retained bucket
    pub oldest_key: Option<TimestampMs>,
    /// Key of the newest bucket
    pub newest_key: Option<TimestampMs>,
    /// Timestamp of the most recently accepted event
    pub last_event_ts: Option<TimestampMs>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::VolumeAverage;
    use crate::clock::ManualClock;
    use crate::types::DataPoint;
    use std::sync::Arc;

    fn engine_at(
        now: TimestampMs,
        window_ms: i64,
        bucket_interval_ms: i64,
    ) -> (
        Arc<ManualClock>,
        SlidingWindowEngine<VolumeAverage, Arc<ManualClock>>,
    ) {
        let clock = Arc::new(ManualClock::new(now));
        let engine = SlidingWindowEngine::new(
            EngineConfig::new(window_ms, bucket_interval_ms),
            Arc::clone(&clock),
        )
        .expect("valid config");
        (clock, engine)
    }

    #[test]
    fn construction_rejects_invalid_config() {
        let clock = ManualClock::new(0);
        let result: Result<SlidingWindowEngine<VolumeAverage, _>> =
            SlidingWindowEngine::new(EngineConfig::new(500, 0), clock);
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn out_of_order_add_is_rejected_and_leaves_state_unchanged() {
        let (_clock, engine) = engine_at(0, 500, 10);
        engine.add(&DataPoint::new(-100, 1.0)).unwrap();
        engine.add(&DataPoint::new(0, 2.0)).unwrap();
        let before = engine.current();
        let before_stats = engine.stats();

        let err = engine.add(&DataPoint::new(-1, 3.0)).unwrap_err();
        assert_eq!(
            err,
            Error::OutOfOrder {
                last: 0,
                offered: -1
            }
        );
        assert_eq!(engine.current(), before);
        assert_eq!(engine.stats(), before_stats);
    }

    #[test]
    fn equal_timestamps_are_accepted() {
        let (_clock, engine) = engine_at(0, 500, 10);
        engine.add(&DataPoint::new(0, 1.0)).unwrap();
        engine.add(&DataPoint::new(0, 3.0)).unwrap();
        let snapshot = engine.current();
        assert_eq!(snapshot.count(), 2);
        assert!((snapshot.mean() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quantization_helpers_floor_and_requantize() {
        let (_clock, engine) = engine_at(0, 999, 100);
        assert_eq!(engine.timestamp_key_of(950), 900);
        assert_eq!(engine.timestamp_key_of(-99), -100);
        // 900 - 999 = -99, which re-quantizes to -100.
        assert_eq!(engine.window_start_key_for(950), -100);
        assert_eq!(engine.window_range_for(950), KeyRange::new(-100, 900));
    }

    #[test]
    fn stats_reflect_the_retained_ledger() {
        let (_clock, engine) = engine_at(0, 500, 10);
        assert_eq!(engine.stats().bucket_count, 0);
        engine.add(&DataPoint::new(-20, 1.0)).unwrap();
        engine.add(&DataPoint::new(0, 2.0)).unwrap();
        let stats = engine.stats();
        assert_eq!(stats.bucket_count, 2);
        assert_eq!(stats.oldest_key, Some(-20));
        assert_eq!(stats.newest_key, Some(0));
        assert_eq!(stats.last_event_ts, Some(0));
    }
}
