//! Network layer for split collection.
//!
//! - [`SplitMessage`] — the wire protocol (postcard, length-prefixed).
//! - [`TcpTransport`] — connects to members and queries splits, verifying
//!   blake3 checksums end to end.
//! - [`SplitServer`] — answers split queries from a [`SplitProvider`].

mod error;
mod message;
mod server;
mod transport;

use std::net::SocketAddr;

use bytes::Bytes;
use tessera_types::SplitTarget;

pub use error::NetError;
pub use message::SplitMessage;
pub use server::{ProviderError, SplitProvider, SplitServer};
pub use transport::{MAX_MESSAGE_SIZE, TcpConnection, TcpTransport};

/// Trait abstracting how the collector reaches other members.
///
/// This allows substituting a mock transport in tests (no sockets needed).
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Open a connection to a member.
    ///
    /// A failure here is retryable; the caller owns the retry policy.
    async fn connect(&self, addr: SocketAddr) -> Result<Box<dyn PeerConnection>, NetError>;
}

/// An open connection to one member.
#[async_trait::async_trait]
pub trait PeerConnection: Send {
    /// Ask the member for the split of `target` it holds at `index`.
    ///
    /// Returns `None` when the member has the document but not the split
    /// slot (or not the document at all).
    async fn query_split(
        &mut self,
        target: &SplitTarget,
        index: usize,
    ) -> Result<Option<Bytes>, NetError>;
}
