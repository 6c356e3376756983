//! Bucket ledger: ordered bucket storage with age-based eviction
//!
//! The ledger owns every live bucket, oldest to newest, and hands out stable
//! sequence handles instead of references. A handle is a monotonically
//! increasing `u64`; the backing deque index is `seq - head_seq`, so popping
//! expired buckets off the front never invalidates the handles a window is
//! holding. A handle older than the retained head is simply detectable as
//! stale.
//!
//! Insertion order equals key order: the engine only feeds the ledger
//! non-decreasing timestamps, so a new key is always appended at the back.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::bucket::Bucket;
use crate::types::TimestampMs;

/// Stable handle to a bucket in the ledger
pub type BucketSeq = u64;

/// Ordered bucket storage plus a key lookup index
#[derive(Debug, Default)]
pub struct BucketLedger<A> {
    /// Live buckets, strictly increasing by key
    buckets: VecDeque<Bucket<A>>,
    /// Key -> sequence handle, for O(1) average lookup
    index: HashMap<TimestampMs, BucketSeq>,
    /// Sequence handle of `buckets[0]`; grows as the front is evicted
    head_seq: BucketSeq,
}

impl<A> BucketLedger<A> {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            buckets: VecDeque::new(),
            index: HashMap::new(),
            head_seq: 0,
        }
    }

    /// Number of live buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True when no buckets are retained
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Handle of the oldest retained bucket
    pub fn oldest_seq(&self) -> Option<BucketSeq> {
        if self.buckets.is_empty() {
            None
        } else {
            Some(self.head_seq)
        }
    }

    /// Handle of the newest bucket
    pub fn newest_seq(&self) -> Option<BucketSeq> {
        if self.buckets.is_empty() {
            None
        } else {
            Some(self.head_seq + self.buckets.len() as u64 - 1)
        }
    }

    /// Oldest retained bucket
    pub fn oldest(&self) -> Option<&Bucket<A>> {
        self.buckets.front()
    }

    /// Newest bucket
    pub fn newest(&self) -> Option<&Bucket<A>> {
        self.buckets.back()
    }

    /// Bucket behind a handle, `None` if the handle is stale or ahead
    pub fn bucket(&self, seq: BucketSeq) -> Option<&Bucket<A>> {
        let offset = seq.checked_sub(self.head_seq)?;
        self.buckets.get(offset as usize)
    }

    pub(crate) fn bucket_mut(&mut self, seq: BucketSeq) -> Option<&mut Bucket<A>> {
        let offset = seq.checked_sub(self.head_seq)?;
        self.buckets.get_mut(offset as usize)
    }

    /// Handle of the bucket with `key`, if one exists
    pub fn seq_of(&self, key: TimestampMs) -> Option<BucketSeq> {
        self.index.get(&key).copied()
    }

    /// Locate the bucket for `key`, creating and appending it if absent
    ///
    /// Appending is valid only because keys arrive non-decreasing; a fresh
    /// key is by construction newer than everything already stored.
    pub fn locate_or_create(&mut self, key: TimestampMs) -> BucketSeq
    where
        A: Default,
    {
        if let Some(&seq) = self.index.get(&key) {
            return seq;
        }
        debug_assert!(
            self.buckets.back().map_or(true, |b| b.key() < key),
            "bucket keys must arrive in non-decreasing order"
        );
        let seq = self.head_seq + self.buckets.len() as u64;
        self.buckets.push_back(Bucket::new(key));
        self.index.insert(key, seq);
        seq
    }

    /// Remove every bucket strictly older than `threshold_key`
    ///
    /// Walks from the oldest end and stops at the first survivor. The evicted
    /// buckets are returned so the caller can settle any window still holding
    /// their contribution.
    pub fn evict_older_than(
        &mut self,
        threshold_key: TimestampMs,
    ) -> Vec<(BucketSeq, Bucket<A>)> {
        let mut evicted = Vec::new();
        while self
            .buckets
            .front()
            .map_or(false, |b| b.key() < threshold_key)
        {
            if let Some(bucket) = self.buckets.pop_front() {
                self.index.remove(&bucket.key());
                evicted.push((self.head_seq, bucket));
                self.head_seq += 1;
            }
        }
        if !evicted.is_empty() {
            debug!(
                evicted = evicted.len(),
                threshold_key, "dropped buckets past the retention horizon"
            );
        }
        evicted
    }
}
