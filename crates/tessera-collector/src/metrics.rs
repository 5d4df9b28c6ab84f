//! Collection counters and per-request reports.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// What happened during one successful collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectReport {
    /// Remote members whose splits were used, ascending.
    pub used_members: Vec<usize>,
    /// Peers that answered without the split before the decision.
    pub misses: usize,
    /// Peers that failed or were unreachable before the decision.
    pub unavailable: usize,
    /// Time from request start to decoded document.
    pub elapsed: Duration,
}

/// Process-wide collection counters.
///
/// Shared by reference between collectors; all updates are relaxed atomics.
#[derive(Debug, Default)]
pub struct CollectorMetrics {
    requests: AtomicU64,
    successes: AtomicU64,
    misses: AtomicU64,
    peer_failures: AtomicU64,
    timeouts: AtomicU64,
    quorum_failures: AtomicU64,
}

/// Point-in-time copy of [`CollectorMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Collection requests started.
    pub requests: u64,
    /// Requests that returned a decoded document.
    pub successes: u64,
    /// Peer answers that lacked the split.
    pub misses: u64,
    /// Peers that were unreachable or failed a query.
    pub peer_failures: u64,
    /// Requests that hit the deadline.
    pub timeouts: u64,
    /// Requests where every peer finished without quorum.
    pub quorum_failures: u64,
}

impl CollectorMetrics {
    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_peer_failure(&self) {
        self.peer_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_quorum_failure(&self) {
        self.quorum_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            peer_failures: self.peer_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            quorum_failures: self.quorum_failures.load(Ordering::Relaxed),
        }
    }
}
