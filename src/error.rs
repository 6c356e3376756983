//! Error types for the sliding-window engine

use thiserror::Error;

use crate::types::TimestampMs;

/// Main error type for the engine
///
/// Every operation either fully applies or fully rejects with one of these
/// variants; there are no partial mutations and no internal retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid window length or bucket interval at construction
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// `add` was called with a timestamp older than the last accepted event
    ///
    /// This is a caller contract violation, not a transient fault; retrying
    /// with the same event will fail again.
    #[error("Out-of-order event: timestamp {offered} precedes last accepted {last}")]
    OutOfOrder {
        /// Timestamp of the most recently accepted event
        last: TimestampMs,
        /// Timestamp of the rejected event
        offered: TimestampMs,
    },

    /// A query asked for an instant further back than one window length
    ///
    /// Only `2 x window_length` of history is retained, so anything older
    /// than one window length before "now" is already partially evicted.
    #[error("Instant {instant} is older than the query horizon (one window of {horizon_ms} ms before now)")]
    HorizonExceeded {
        /// The requested instant
        instant: TimestampMs,
        /// The window length bounding how far back queries may reach
        horizon_ms: i64,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_values() {
        let err = Error::OutOfOrder {
            last: 1_000,
            offered: 999,
        };
        let text = err.to_string();
        assert!(text.contains("999"));
        assert!(text.contains("1000"));

        let err = Error::HorizonExceeded {
            instant: -501,
            horizon_ms: 500,
        };
        assert!(err.to_string().contains("500"));
    }
}
