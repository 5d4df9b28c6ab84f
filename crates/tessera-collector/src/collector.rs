//! Quorum split collection.
//!
//! A collection request fans out one task per remote member. Each task owns
//! its inputs (transport handle, address, target) and reports a single
//! outcome through the [`JoinSet`]. The request waits until `k - 1` usable
//! splits have arrived, keeps the lowest member indices among the answers
//! already in, aborts and joins the remaining tasks, then decodes.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tessera_codec::{DocumentCodec, payload_length};
use tessera_erasure::Split;
use tessera_net::Transport;
use tessera_types::{Document, SplitTarget};
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;
use tracing::{Instrument, debug, info, warn};

use crate::config::CollectorConfig;
use crate::error::CollectError;
use crate::membership::Membership;
use crate::metrics::{CollectReport, CollectorMetrics};
use crate::retry::RetryPolicy;

/// A decoded document together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    /// The fully reconstructed document.
    pub document: Document,
    /// Which members contributed and what went wrong along the way.
    pub report: CollectReport,
}

/// What one peer task produced.
#[derive(Debug)]
enum PeerOutcome {
    Split(Bytes),
    Miss,
    Unavailable,
}

/// Answers gathered so far for one request.
#[derive(Debug, Default)]
struct Round {
    collected: BTreeMap<usize, Bytes>,
    misses: usize,
    unavailable: usize,
}

/// Collects remote splits for a locally held document and decodes it.
pub struct SplitCollector {
    codec: DocumentCodec,
    membership: Arc<dyn Membership>,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    request_timeout: Duration,
    metrics: Arc<CollectorMetrics>,
}

impl SplitCollector {
    /// Create a collector.
    ///
    /// The membership must list exactly `m` members, agree on `k` and
    /// place this member inside the list.
    pub fn new(
        codec: DocumentCodec,
        membership: Arc<dyn Membership>,
        transport: Arc<dyn Transport>,
        config: &CollectorConfig,
    ) -> Result<Self, CollectError> {
        let k = codec.coder().source_splits();
        let m = codec.coder().total_splits();
        let members = membership.members().len();
        if members != m {
            return Err(CollectError::InvalidMembership(format!(
                "{members} members for m={m}"
            )));
        }
        if membership.required_source_splits() != k {
            return Err(CollectError::InvalidMembership(format!(
                "membership k={} but coder k={k}",
                membership.required_source_splits()
            )));
        }
        if membership.self_index() >= m {
            return Err(CollectError::InvalidMembership(format!(
                "self index {} out of range for m={m}",
                membership.self_index()
            )));
        }

        Ok(Self {
            codec,
            membership,
            transport,
            retry: config.retry_policy(),
            request_timeout: config.request_timeout(),
            metrics: Arc::new(CollectorMetrics::default()),
        })
    }

    /// Share a metrics instance with other collectors.
    pub fn with_metrics(mut self, metrics: Arc<CollectorMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Counters for this collector.
    pub fn metrics(&self) -> &Arc<CollectorMetrics> {
        &self.metrics
    }

    /// The codec used for decoding.
    pub fn codec(&self) -> &DocumentCodec {
        &self.codec
    }

    /// Rebuild `local` by collecting `k - 1` splits of `target` from peers.
    ///
    /// `local` must be this member's encoded document, either complete or
    /// projected to its own split. With `k == 1` no peer is contacted.
    #[tracing::instrument(skip(self, local, target), fields(ns = %target.namespace, id = %target.id))]
    pub async fn collect(
        &self,
        local: &Document,
        target: &SplitTarget,
    ) -> Result<Collected, CollectError> {
        let start = Instant::now();
        self.metrics.record_request();

        let self_index = self.membership.self_index();
        let needed = self.codec.coder().source_splits() - 1;

        self.codec
            .split_of(local, self_index)
            .map_err(|source| CollectError::MissingLocalSplit {
                index: self_index,
                source,
            })?;
        let split_size = self.codec.coder().split_size(payload_length(local)?);

        let round = if needed == 0 {
            Round::default()
        } else {
            self.fetch(target, self_index, needed, split_size, start)
                .await?
        };

        let remote: Vec<Split> = round
            .collected
            .into_iter()
            .take(needed)
            .map(|(member, data)| Split::new(member, data))
            .collect();
        let used_members: Vec<usize> = remote.iter().map(|s| s.index).collect();

        let document = self.codec.decode_with_splits(local, self_index, remote)?;

        let report = CollectReport {
            used_members,
            misses: round.misses,
            unavailable: round.unavailable,
            elapsed: start.elapsed(),
        };
        self.metrics.record_success();
        info!(
            used = ?report.used_members,
            misses = report.misses,
            unavailable = report.unavailable,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "document collected"
        );

        Ok(Collected { document, report })
    }

    /// Fan out to every other member and wait for `needed` usable splits.
    async fn fetch(
        &self,
        target: &SplitTarget,
        self_index: usize,
        needed: usize,
        split_size: usize,
        start: Instant,
    ) -> Result<Round, CollectError> {
        let deadline = start + self.request_timeout;

        let mut tasks = JoinSet::new();
        for (member, &addr) in self.membership.members().iter().enumerate() {
            if member == self_index {
                continue;
            }
            let transport = self.transport.clone();
            let target = target.clone();
            let retry = self.retry;
            tasks.spawn(
                async move {
                    let outcome = query_member(transport, retry, addr, &target, member).await;
                    (member, outcome)
                }
                .in_current_span(),
            );
        }
        debug!(peers = tasks.len(), needed, split_size, "collecting splits");

        let mut round = Round::default();
        while round.collected.len() < needed {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(joined)) => self.record(&mut round, joined, split_size),
                Ok(None) => {
                    self.metrics.record_quorum_failure();
                    warn!(
                        needed,
                        collected = round.collected.len(),
                        misses = round.misses,
                        unavailable = round.unavailable,
                        "all peers answered without quorum"
                    );
                    return Err(CollectError::QuorumUnreachable {
                        needed,
                        collected: round.collected.len(),
                        misses: round.misses,
                        unavailable: round.unavailable,
                    });
                }
                Err(_) => {
                    tasks.shutdown().await;
                    self.metrics.record_timeout();
                    let elapsed = start.elapsed();
                    warn!(
                        needed,
                        collected = round.collected.len(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "collection deadline passed"
                    );
                    return Err(CollectError::Timeout {
                        needed,
                        collected: round.collected.len(),
                        elapsed,
                    });
                }
            }
        }

        // Answers already in take part in the lowest-index selection.
        while let Some(joined) = tasks.try_join_next() {
            self.record(&mut round, joined, split_size);
        }
        let outstanding = tasks.len();
        tasks.shutdown().await;
        debug!(
            collected = round.collected.len(),
            outstanding, "quorum reached"
        );

        Ok(round)
    }

    fn record(
        &self,
        round: &mut Round,
        joined: Result<(usize, PeerOutcome), JoinError>,
        split_size: usize,
    ) {
        match joined {
            Ok((member, PeerOutcome::Split(data))) if data.len() == split_size => {
                debug!(member, "received split");
                round.collected.insert(member, data);
            }
            Ok((member, PeerOutcome::Split(data))) => {
                warn!(
                    member,
                    got = data.len(),
                    expected = split_size,
                    "discarding split of wrong size"
                );
                round.unavailable += 1;
                self.metrics.record_peer_failure();
            }
            Ok((member, PeerOutcome::Miss)) => {
                debug!(member, "member has no split");
                round.misses += 1;
                self.metrics.record_miss();
            }
            Ok((_, PeerOutcome::Unavailable)) => {
                round.unavailable += 1;
                self.metrics.record_peer_failure();
            }
            Err(e) => {
                warn!("peer task failed: {e}");
                round.unavailable += 1;
                self.metrics.record_peer_failure();
            }
        }
    }
}

/// Connect to one member and ask for its split.
async fn query_member(
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    addr: SocketAddr,
    target: &SplitTarget,
    member: usize,
) -> PeerOutcome {
    let mut conn = match retry.connect(transport.as_ref(), addr).await {
        Ok(conn) => conn,
        Err(_) => return PeerOutcome::Unavailable,
    };
    match conn.query_split(target, member).await {
        Ok(Some(data)) => PeerOutcome::Split(data),
        Ok(None) => PeerOutcome::Miss,
        Err(e) => {
            warn!(member, %addr, "split query failed: {e}");
            PeerOutcome::Unavailable
        }
    }
}
