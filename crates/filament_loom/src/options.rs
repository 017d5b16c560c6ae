//! Scheduler tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Time budgets for cooperative scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerOptions {
    /// Yield once less than this much time is left in a slice.
    #[serde(rename = "yieldThresholdMs", with = "millis")]
    pub yield_threshold: Duration,

    /// Length of one idle slice handed out by [`IdleLoop`](crate::IdleLoop).
    #[serde(rename = "sliceMs", with = "millis")]
    pub slice: Duration,

    /// After this long without settling, slices report a timed-out deadline
    /// and the remaining work runs without yielding.
    #[serde(rename = "idleTimeoutMs", with = "millis")]
    pub idle_timeout: Duration,

    /// Upper bound on slices per [`IdleLoop::run`](crate::IdleLoop::run).
    pub max_slices: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            slice: Duration::from_millis(16),
            idle_timeout: Duration::from_millis(500),
            max_slices: 10_000,
        }
    }
}

impl SchedulerOptions {
    /// Create the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the yield threshold.
    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }

    /// Set the slice length.
    pub fn with_slice(mut self, slice: Duration) -> Self {
        self.slice = slice;
        self
    }

    /// Set the idle timeout.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Set the slice limit.
    pub fn with_max_slices(mut self, max_slices: usize) -> Self {
        self.max_slices = max_slices;
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
