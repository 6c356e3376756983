//! Engine configuration with serde support and validation

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sliding-window engine configuration
///
/// Deserializable from TOML/JSON with per-field defaults, or built in code
/// with the `with_*` methods. Validation happens at engine construction;
/// an invalid configuration never produces a partially working engine.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use rollwin::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_window(Duration::from_millis(500))
///     .with_bucket_interval_ms(10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Window length in milliseconds (default: 60 000)
    #[serde(default = "default_window_ms")]
    pub window_ms: i64,

    /// Bucket width in milliseconds (default: 1 000)
    #[serde(default = "default_bucket_interval_ms")]
    pub bucket_interval_ms: i64,
}

fn default_window_ms() -> i64 {
    60_000 // one minute
}

fn default_bucket_interval_ms() -> i64 {
    1_000 // one second
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            bucket_interval_ms: default_bucket_interval_ms(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration from raw millisecond values
    pub fn new(window_ms: i64, bucket_interval_ms: i64) -> Self {
        Self {
            window_ms,
            bucket_interval_ms,
        }
    }

    /// Set the window length from a `Duration`
    ///
    /// Durations beyond the `i64` millisecond range saturate and are then
    /// rejected by [`validate`](Self::validate).
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window_ms = window.as_millis().min(i64::MAX as u128) as i64;
        self
    }

    /// Set the window length in milliseconds
    pub fn with_window_ms(mut self, window_ms: i64) -> Self {
        self.window_ms = window_ms;
        self
    }

    /// Set the bucket width in milliseconds
    pub fn with_bucket_interval_ms(mut self, bucket_interval_ms: i64) -> Self {
        self.bucket_interval_ms = bucket_interval_ms;
        self
    }

    /// Retention horizon: buckets older than `2 x window_ms` behind "now"
    /// are evicted, which leaves enough history to answer queries for any
    /// instant up to one window length in the past
    pub fn internal_window_ms(&self) -> i64 {
        self.window_ms.saturating_mul(2)
    }

    /// Check the configuration
    ///
    /// The bucket interval must be a positive number of milliseconds; the
    /// window length must be positive and small enough that the retention
    /// horizon `2 x window_ms` stays representable.
    pub fn validate(&self) -> Result<()> {
        if self.bucket_interval_ms <= 0 {
            return Err(Error::Configuration(format!(
                "bucket interval must be positive, got {} ms",
                self.bucket_interval_ms
            )));
        }
        if self.window_ms <= 0 {
            return Err(Error::Configuration(format!(
                "window length must be positive, got {} ms",
                self.window_ms
            )));
        }
        if self.window_ms.checked_mul(2).is_none() {
            return Err(Error::Configuration(format!(
                "window length {} ms overflows the retention horizon",
                self.window_ms
            )));
        }
        Ok(())
    }
}
