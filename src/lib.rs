//! rollwin - bucketed sliding-window aggregation over event streams
//!
//! This library maintains a continuously updated aggregate (a running
//! average, volume, or count) over the most recent fixed time interval of a
//! timestamped event stream, without rescanning retained events on every
//! query. It is the primitive that sits inside trading engines, rate
//! limiters, and real-time telemetry pipelines to answer "what is the
//! aggregate over the trailing N milliseconds?" cheaply as time advances
//! and events arrive.
//!
//! Events are quantized into fixed-width buckets, each holding one
//! incrementally maintained aggregate; a live window reconciles itself
//! against the bucket ledger by merging buckets entering the range and
//! subtracting buckets leaving it. Only the boundary delta is touched, so
//! adds and queries are amortized O(1). Buckets older than twice the window
//! length are evicted, which retains enough history to answer queries for
//! any instant up to one window length in the past.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rollwin::{DataPoint, EngineConfig, ManualClock, SlidingWindowEngine, VolumeAverage};
//!
//! # fn main() -> rollwin::Result<()> {
//! let clock = Arc::new(ManualClock::new(0));
//! let engine: SlidingWindowEngine<VolumeAverage, _> =
//!     SlidingWindowEngine::new(EngineConfig::new(500, 10), Arc::clone(&clock))?;
//!
//! engine.add(&DataPoint::new(-600, 100.0))?; // already outside the window
//! engine.add(&DataPoint::new(-20, 4.0))?;
//! engine.add(&DataPoint::new(0, 8.0))?;
//!
//! let snapshot = engine.current();
//! assert_eq!(snapshot.count(), 2);
//! assert_eq!(snapshot.mean(), 6.0);
//!
//! // Windows ending at a past instant are answered from the same buckets.
//! assert_eq!(engine.aggregate_as_of(-500)?.count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Out-of-chronological-order events are a caller contract violation and
//! are rejected; there is no reordering or buffering. Persistence and
//! multi-window caching are out of scope.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregate;
pub mod bucket;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod types;
pub mod window;

pub use aggregate::{Aggregate, EventCount, MergeEvent, VolumeAverage};
pub use bucket::{bucket_key_of, Bucket};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{EngineStats, SlidingWindowEngine};
pub use error::{Error, Result};
pub use ledger::{BucketLedger, BucketSeq};
pub use types::{DataPoint, KeyRange, Timestamped, TimestampMs};
pub use window::Window;
