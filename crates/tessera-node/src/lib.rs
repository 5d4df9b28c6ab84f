//! Replica node for Tessera.
//!
//! Ties the codec, the collector and the split server together:
//!
//! - [`ReplicaNode`] — write path (encode, keep own split), read path
//!   (collect and decode) and the [`SplitProvider`](tessera_net::SplitProvider)
//!   peers query.
//! - [`DocumentStore`] / [`MemoryDocumentStore`] — local storage.
//! - [`NodeConfig`] — TOML configuration.

mod config;
mod error;
mod node;
mod store;
mod telemetry;

pub use config::{
    ClusterSection, ErasureSection, IndexSection, LogSection, NodeConfig, NodeSection,
};
pub use error::{ConfigError, NodeError};
pub use node::ReplicaNode;
pub use store::{DocumentStore, MemoryDocumentStore};
pub use telemetry::init_logging;
