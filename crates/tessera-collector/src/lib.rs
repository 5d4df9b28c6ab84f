//! Distributed split collection.
//!
//! Given the locally held encoded document, [`SplitCollector`] fetches
//! `k - 1` further splits from other replica members in parallel and
//! decodes the full document once quorum is reached.
//!
//! Connects are retried per [`RetryPolicy`]; the whole request is bounded
//! by a deadline, so a starved quorum surfaces as an error instead of a
//! hang.

mod collector;
mod config;
mod error;
mod membership;
mod metrics;
mod retry;

pub use collector::{Collected, SplitCollector};
pub use config::CollectorConfig;
pub use error::CollectError;
pub use membership::{Membership, StaticMembership};
pub use metrics::{CollectReport, CollectorMetrics, MetricsSnapshot};
pub use retry::RetryPolicy;
