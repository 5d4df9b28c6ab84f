//! Collector tuning, usable as the `[collector]` section of a TOML config.

use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

/// `[collector]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Connect attempts per member before it is reported unavailable.
    pub max_connect_attempts: u32,
    /// First retry delay in milliseconds.
    pub initial_backoff_ms: u64,
    /// Cap on any retry delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Per-query timeout in milliseconds.
    pub query_timeout_ms: u64,
    /// Overall deadline for one collection request in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_connect_attempts: 5,
            initial_backoff_ms: 50,
            max_backoff_ms: 2_000,
            query_timeout_ms: 30_000,
            request_timeout_ms: 60_000,
        }
    }
}

impl CollectorConfig {
    /// Connect retry policy.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_connect_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }

    /// Timeout for a single connect or query.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Deadline for a whole collection request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
