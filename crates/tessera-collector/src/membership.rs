//! Replica-set membership as seen by the collector.

use std::net::SocketAddr;

use crate::error::CollectError;

/// Source of replica-set membership.
///
/// Member `i` holds split `i`; [`members`](Membership::members) lists every
/// member including this one, in index order.
pub trait Membership: Send + Sync {
    /// Index of this member.
    fn self_index(&self) -> usize;

    /// Network addresses of all members, index = split index.
    fn members(&self) -> &[SocketAddr];

    /// Number of source splits (k).
    fn required_source_splits(&self) -> usize;
}

/// Fixed membership, typically loaded from configuration.
#[derive(Debug, Clone)]
pub struct StaticMembership {
    self_index: usize,
    members: Vec<SocketAddr>,
    k: usize,
}

impl StaticMembership {
    /// Create a membership view.
    ///
    /// Requires `1 <= k <= members.len()` and `self_index < members.len()`.
    pub fn new(self_index: usize, members: Vec<SocketAddr>, k: usize) -> Result<Self, CollectError> {
        if k == 0 || k > members.len() {
            return Err(CollectError::InvalidMembership(format!(
                "k={k} with {} members",
                members.len()
            )));
        }
        if self_index >= members.len() {
            return Err(CollectError::InvalidMembership(format!(
                "self index {self_index} out of range for {} members",
                members.len()
            )));
        }
        Ok(Self {
            self_index,
            members,
            k,
        })
    }
}

impl Membership for StaticMembership {
    fn self_index(&self) -> usize {
        self.self_index
    }

    fn members(&self) -> &[SocketAddr] {
        &self.members
    }

    fn required_source_splits(&self) -> usize {
        self.k
    }
}
