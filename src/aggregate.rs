//! Aggregate capability contract and reference implementations
//!
//! The engine is generic over the summary it maintains. Any type can be
//! windowed as long as it is an incrementally mergeable and subtractable
//! accumulator:
//!
//! - [`Aggregate`]: the summary algebra (fold in another summary, remove a
//!   previously folded summary). Merging a set of summaries in any consistent
//!   order must yield the same result, and subtract must be the exact
//!   algebraic inverse of merge for the same operand.
//! - [`MergeEvent`]: folding one raw event into a summary.
//!
//! Both are resolved statically; there is no boxing or dynamic dispatch on
//! the add/query hot path.
//!
//! Two implementations ship with the crate: [`VolumeAverage`], a
//! volume-weighted running mean over [`DataPoint`]s, and [`EventCount`], a
//! plain event counter usable with any event type (the rate-limiter case).

use serde::{Deserialize, Serialize};

use crate::types::DataPoint;

/// Incrementally mergeable and subtractable summary of a set of events
///
/// `Default` is the identity (empty) summary and doubles as the factory the
/// engine uses when it creates buckets and windows.
pub trait Aggregate: Clone + Default {
    /// Fold another summary into this one
    fn merge_aggregate(&mut self, other: &Self);

    /// Remove a summary previously folded in via [`merge_aggregate`]
    ///
    /// Must be the exact inverse of the merge for the same `other`. If the
    /// subtraction would drop the running count to zero or below, the
    /// summary resets to its identity state instead of going negative.
    ///
    /// [`merge_aggregate`]: Aggregate::merge_aggregate
    fn subtract_aggregate(&mut self, other: &Self);
}

/// Folding one raw event into a summary
pub trait MergeEvent<E>: Aggregate {
    /// Fold a single event into this summary
    fn merge_event(&mut self, event: &E);
}

// ============================================================================
// VolumeAverage
// ============================================================================

/// Volume-weighted running average of [`DataPoint`] values
///
/// Maintains `(mean, count)` and recomputes the mean as
/// `(old * old_count ± delta * delta_count) / new_count` on every merge and
/// subtract, so the weighted total is carried implicitly and the mean stays
/// exact up to floating-point association.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeAverage {
    mean: f64,
    count: u64,
}

impl VolumeAverage {
    /// Mean of the folded values, `0.0` when empty
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Number of events folded in
    pub fn count(&self) -> u64 {
        self.count
    }

    /// True when no events are represented
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Aggregate for VolumeAverage {
    fn merge_aggregate(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        let count = self.count + other.count;
        self.mean =
            (self.mean * self.count as f64 + other.mean * other.count as f64) / count as f64;
        self.count = count;
    }

    fn subtract_aggregate(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if other.count >= self.count {
            self.reset();
            return;
        }
        let count = self.count - other.count;
        self.mean =
            (self.mean * self.count as f64 - other.mean * other.count as f64) / count as f64;
        self.count = count;
    }
}

impl MergeEvent<DataPoint> for VolumeAverage {
    fn merge_event(&mut self, event: &DataPoint) {
        let total = self.mean * self.count as f64 + event.value;
        self.count += 1;
        self.mean = total / self.count as f64;
    }
}

// ============================================================================
// EventCount
// ============================================================================

/// Plain event counter
///
/// Ignores event payloads entirely, so it windows any event type. The
/// trailing-window count is the primitive a rate limiter needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCount {
    count: u64,
}

impl EventCount {
    /// Number of events folded in
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Aggregate for EventCount {
    fn merge_aggregate(&mut self, other: &Self) {
        self.count += other.count;
    }

    fn subtract_aggregate(&mut self, other: &Self) {
        self.count = self.count.saturating_sub(other.count);
    }
}

impl<E> MergeEvent<E> for EventCount {
    fn merge_event(&mut self, _event: &E) {
        self.count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avg_of(values: &[f64]) -> VolumeAverage {
        let mut agg = VolumeAverage::default();
        for (i, v) in values.iter().enumerate() {
            agg.merge_event(&DataPoint::new(i as i64, *v));
        }
        agg
    }

    #[test]
    fn running_mean_tracks_folded_values() {
        let agg = avg_of(&[10.0, 20.0, 30.0]);
        assert_eq!(agg.count(), 3);
        assert!((agg.mean() - 20.0).abs() < 1e-12);
    }

    #[test]
    fn subtract_is_the_inverse_of_merge() {
        let a = avg_of(&[500.0, 400.0, 300.0]);
        let b = avg_of(&[200.0, 100.0]);

        let mut merged = a;
        merged.merge_aggregate(&b);
        assert_eq!(merged.count(), 5);
        assert!((merged.mean() - 300.0).abs() < 1e-9);

        merged.subtract_aggregate(&b);
        assert_eq!(merged.count(), a.count());
        assert!((merged.mean() - a.mean()).abs() < 1e-9);
    }

    #[test]
    fn subtracting_everything_resets_to_identity() {
        let mut agg = avg_of(&[1.0, 2.0]);
        let same = agg;
        agg.subtract_aggregate(&same);
        assert!(agg.is_empty());
        assert_eq!(agg.mean(), 0.0);
    }

    #[test]
    fn oversubtraction_clamps_to_identity_instead_of_going_negative() {
        let mut small = avg_of(&[5.0]);
        let big = avg_of(&[1.0, 2.0, 3.0]);
        small.subtract_aggregate(&big);
        assert!(small.is_empty());
    }

    #[test]
    fn merging_the_identity_is_a_no_op() {
        let mut agg = avg_of(&[42.0]);
        let before = agg;
        agg.merge_aggregate(&VolumeAverage::default());
        agg.subtract_aggregate(&VolumeAverage::default());
        assert_eq!(agg, before);
    }

    #[test]
    fn event_count_ignores_the_payload() {
        let mut count = EventCount::default();
        count.merge_event(&DataPoint::new(0, 1.0));
        count.merge_event(&"anything at all");
        assert_eq!(count.count(), 2);

        let mut other = EventCount::default();
        other.merge_event(&0u8);
        count.subtract_aggregate(&other);
        assert_eq!(count.count(), 1);
    }
}
