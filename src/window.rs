//! Window: an incrementally reconciled view over a run of buckets
//!
//! A window is one aggregate plus a cursor, an inclusive span of ledger
//! handles, remembering which contiguous run of buckets the aggregate
//! currently represents. It never owns buckets and never rescans them: as
//! the target range moves, [`Window::reconcile`] touches only the buckets
//! entering or leaving at the two boundaries, which keeps every update
//! amortized O(1).
//!
//! Invariant: at any stable point the aggregate equals the merge of every
//! bucket inside the span, plus any raw events absorbed at the head since
//! those events' bucket was appended (the bucket holds them too, so the
//! bucket-level subtract on expiry removes them exactly).
//!
//! # Reconciliation
//!
//! Given a target key range, four boundary adjustments run in order:
//!
//! 1. **Catch-up**: a span handle can lag behind the ledger's retained head
//!    if buckets were dropped while the window was stale; the handle moves
//!    up without a subtraction, because the engine already settled those
//!    buckets when the ledger released them.
//! 2. **Shift right**: subtract buckets whose key fell behind the start of
//!    the range and advance the trailing edge past them.
//! 3. **Retract**: for a target behind the current head (a past-instant
//!    query), subtract buckets whose key exceeds the end of the range,
//!    walking the leading edge backward. The span may empty here; the
//!    crossing point is remembered so the next step can re-grow it.
//! 4. **Extend left**: merge in buckets sitting just before the trailing
//!    edge whose key is still inside the range, walking backward.
//!
//! The span only ever moves monotonically within one call, and between
//! calls the engine guarantees the target range moves forward (the live
//! window) or the window is a fresh clone (past-instant probes), so no
//! bucket is ever merged or subtracted twice.

use crate::aggregate::{Aggregate, MergeEvent};
use crate::bucket::Bucket;
use crate::ledger::{BucketLedger, BucketSeq};
use crate::types::KeyRange;

/// Reconciled aggregate over a contiguous run of ledger buckets
#[derive(Debug, Clone)]
pub struct Window<A> {
    aggregate: A,
    /// Inclusive handle span `[first, last]`; `None` when no buckets are
    /// represented
    span: Option<(BucketSeq, BucketSeq)>,
}

impl<A: Aggregate> Default for Window<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Aggregate> Window<A> {
    /// Create an empty window
    pub fn new() -> Self {
        Self {
            aggregate: A::default(),
            span: None,
        }
    }

    /// The represented aggregate
    pub fn aggregate(&self) -> &A {
        &self.aggregate
    }

    /// Consume the window, returning its aggregate
    pub fn into_aggregate(self) -> A {
        self.aggregate
    }

    /// Handle span currently represented, oldest to newest
    pub fn span(&self) -> Option<(BucketSeq, BucketSeq)> {
        self.span
    }

    /// Fold one raw event into the window and grow the span to its bucket
    ///
    /// Called on the add path right after the event was merged into the
    /// bucket behind `seq`. Events arrive in non-decreasing time order, so
    /// `seq` is never behind the trailing edge of a non-empty span.
    pub fn absorb<E>(&mut self, seq: BucketSeq, event: &E)
    where
        A: MergeEvent<E>,
    {
        self.aggregate.merge_event(event);
        match self.span {
            None => self.span = Some((seq, seq)),
            Some((first, last)) => {
                debug_assert!(seq >= first, "events must not land behind the trailing edge");
                if seq > last {
                    self.span = Some((first, seq));
                }
            }
        }
    }

    /// Settle an evicted bucket that this window may still represent
    ///
    /// The ledger evicts strictly from the oldest end, so an in-span evicted
    /// bucket is always the span's trailing bucket: subtract it and advance
    /// the trailing edge. Out-of-span evictions are ignored.
    pub fn release(&mut self, seq: BucketSeq, bucket: &Bucket<A>) {
        let Some((first, last)) = self.span else {
            return;
        };
        if seq < first || seq > last {
            return;
        }
        debug_assert!(seq == first, "ledger eviction is oldest-first");
        self.aggregate.subtract_aggregate(bucket.aggregate());
        self.span = if first == last {
            None
        } else {
            Some((seq + 1, last))
        };
    }

    /// Reconcile the window to cover exactly the buckets inside `target`
    ///
    /// Afterwards the span is the maximal contiguous run of ledger buckets
    /// with `target.start <= key <= target.end`, and the aggregate is the
    /// merge over that run. Only the boundary delta is touched.
    pub fn reconcile(&mut self, ledger: &BucketLedger<A>, target: KeyRange) {
        // Catch-up: handles behind the ledger's retained head reference
        // buckets that no longer exist. Their contribution was settled via
        // `release` when the ledger dropped them, so only the handle moves.
        if let Some((first, last)) = self.span {
            match ledger.oldest_seq() {
                Some(head) if first < head => {
                    self.span = if last < head { None } else { Some((head, last)) };
                }
                None => self.span = None,
                _ => {}
            }
        }

        // Shift right: the start of the range moved forward past the
        // trailing edge; subtract each expired bucket and advance.
        while let Some((first, last)) = self.span {
            let Some(bucket) = ledger.bucket(first) else {
                break;
            };
            if bucket.key() >= target.start {
                break;
            }
            self.aggregate.subtract_aggregate(bucket.aggregate());
            self.span = if first == last {
                None
            } else {
                Some((first + 1, last))
            };
        }

        // Retract: the end of the range sits behind the leading edge
        // (past-instant targets). Subtract newer-than-range buckets walking
        // backward. When the whole span is consumed, remember where it
        // crossed so the extend pass can re-grow the window from there.
        let mut crossed_at: Option<BucketSeq> = None;
        while let Some((first, last)) = self.span {
            let Some(bucket) = ledger.bucket(last) else {
                break;
            };
            if bucket.key() <= target.end {
                break;
            }
            self.aggregate.subtract_aggregate(bucket.aggregate());
            if first == last {
                crossed_at = Some(first);
                self.span = None;
            } else {
                self.span = Some((first, last - 1));
            }
        }

        // Extend left: pull in buckets just before the trailing edge that
        // the range now covers, walking backward until the ledger runs out
        // or a bucket falls below the start of the range.
        loop {
            let anchor = match self.span {
                Some((first, _)) => first,
                None => match crossed_at.take() {
                    Some(pos) => pos,
                    None => break,
                },
            };
            let Some(prev) = anchor.checked_sub(1) else {
                break;
            };
            let Some(bucket) = ledger.bucket(prev) else {
                break;
            };
            if bucket.key() < target.start {
                break;
            }
            debug_assert!(
                bucket.key() <= target.end,
                "buckets below the trailing edge cannot exceed the range end"
            );
            self.aggregate.merge_aggregate(bucket.aggregate());
            self.span = Some(match self.span {
                Some((_, last)) => (prev, last),
                None => (prev, prev),
            });
        }
    }
}
