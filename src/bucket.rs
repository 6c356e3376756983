//! Fixed-width time buckets and timestamp quantization

use crate::types::TimestampMs;

/// Quantize a timestamp down to its bucket key
///
/// `key = floor(timestamp / interval) * interval`, flooring toward negative
/// infinity rather than truncating toward zero, so pre-epoch timestamps
/// quantize into the correct slot (`-1 ms` with a 10 ms interval belongs to
/// bucket `-10`, not bucket `0`).
///
/// `interval_ms` must be positive; the engine validates this at construction.
pub fn bucket_key_of(timestamp: TimestampMs, interval_ms: i64) -> TimestampMs {
    debug_assert!(interval_ms > 0, "bucket interval must be positive");
    timestamp.div_euclid(interval_ms) * interval_ms
}

/// One fixed-width time slot
///
/// Identified by its quantized key and holding one aggregate summarizing
/// every event whose timestamp quantizes into the slot. Buckets are created
/// lazily on the first event in their slot and are never split or merged
/// with a neighbor; the key never changes after creation.
#[derive(Debug, Clone)]
pub struct Bucket<A> {
    key: TimestampMs,
    aggregate: A,
}

impl<A> Bucket<A> {
    pub(crate) fn new(key: TimestampMs) -> Self
    where
        A: Default,
    {
        Self {
            key,
            aggregate: A::default(),
        }
    }

    /// Quantized timestamp identifying this slot
    pub fn key(&self) -> TimestampMs {
        self.key
    }

    /// Summary of every event in this slot
    pub fn aggregate(&self) -> &A {
        &self.aggregate
    }

    pub(crate) fn aggregate_mut(&mut self) -> &mut A {
        &mut self.aggregate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantization_floors_toward_negative_infinity() {
        assert_eq!(bucket_key_of(0, 10), 0);
        assert_eq!(bucket_key_of(9, 10), 0);
        assert_eq!(bucket_key_of(10, 10), 10);
        assert_eq!(bucket_key_of(-1, 10), -10);
        assert_eq!(bucket_key_of(-10, 10), -10);
        assert_eq!(bucket_key_of(-11, 10), -20);
        assert_eq!(bucket_key_of(-100, 1_000), -1_000);
        assert_eq!(bucket_key_of(-99, 100), -100);
    }

    #[test]
    fn same_key_means_same_slot() {
        assert_eq!(bucket_key_of(101, 10), bucket_key_of(109, 10));
        assert_ne!(bucket_key_of(109, 10), bucket_key_of(110, 10));
    }
}
