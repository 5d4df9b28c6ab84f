//! [`ReplicaNode`]: one member of an erasure-coded replica set.
//!
//! The node encodes documents on write, stores only its own split, answers
//! split queries from peers and rebuilds documents on read by collecting
//! splits from the other members.

use std::sync::Arc;

use bytes::Bytes;
use tessera_codec::{DocumentCodec, IndexCatalog, project_split};
use tessera_collector::{Collected, CollectorMetrics, SplitCollector, StaticMembership};
use tessera_erasure::ErasureCoder;
use tessera_net::{ProviderError, SplitProvider, Transport};
use tessera_types::{Document, DocumentId, Namespace, SplitTarget};
use tracing::{debug, info};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::store::DocumentStore;

/// One member of a replica set.
pub struct ReplicaNode {
    self_index: usize,
    codec: DocumentCodec,
    catalog: Arc<dyn IndexCatalog>,
    store: Arc<dyn DocumentStore>,
    collector: SplitCollector,
}

impl ReplicaNode {
    /// Build a node from validated configuration.
    pub fn new(
        config: &NodeConfig,
        store: Arc<dyn DocumentStore>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let erasure = config.erasure_config();
        let coder = Arc::new(ErasureCoder::from_config(erasure)?);
        let codec = DocumentCodec::new(coder);
        let membership =
            StaticMembership::new(config.node.self_index, config.members()?, erasure.k)?;
        let collector = SplitCollector::new(
            codec.clone(),
            Arc::new(membership),
            transport,
            &config.collector,
        )?;

        info!(
            self_index = config.node.self_index,
            k = erasure.k,
            m = erasure.m,
            "replica node ready"
        );

        Ok(Self {
            self_index: config.node.self_index,
            codec,
            catalog: Arc::new(config.index_catalog()),
            store,
            collector,
        })
    }

    /// Share collector metrics with other nodes.
    pub fn with_metrics(mut self, metrics: Arc<CollectorMetrics>) -> Self {
        self.collector = self.collector.with_metrics(metrics);
        self
    }

    /// This member's split index.
    pub fn self_index(&self) -> usize {
        self.self_index
    }

    /// The local document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Collector counters.
    pub fn metrics(&self) -> &Arc<CollectorMetrics> {
        self.collector.metrics()
    }

    // ------------------------------------------------------------------
    // Write path
    // ------------------------------------------------------------------

    /// Encode and store a new document.
    ///
    /// Only this member's split is kept locally. Returns the full encoded
    /// document, which the host replicates to the other members via
    /// [`apply_replicated`](Self::apply_replicated).
    pub async fn insert(
        &self,
        namespace: &Namespace,
        id: &DocumentId,
        document: &Document,
    ) -> Result<Document, NodeError> {
        let target = SplitTarget::new(namespace.clone(), id.clone());
        let encoded = self
            .codec
            .encode_document(document, self.catalog.as_ref())?;
        self.apply_replicated(&target, &encoded).await?;
        debug!(%target, "inserted document");
        Ok(encoded)
    }

    /// Store this member's share of a fully encoded document.
    pub async fn apply_replicated(
        &self,
        target: &SplitTarget,
        encoded: &Document,
    ) -> Result<(), NodeError> {
        let own = project_split(encoded, self.self_index)?;
        self.store.put(target, own).await
    }

    /// Remove a document.
    pub async fn delete(&self, namespace: &Namespace, id: &DocumentId) -> Result<(), NodeError> {
        let target = SplitTarget::new(namespace.clone(), id.clone());
        self.store.delete(&target).await
    }

    // ------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------

    /// Read a document, rebuilding it from peer splits.
    ///
    /// Field values come back unchanged, but indexed fields come first (in
    /// their original relative order) followed by the non-indexed fields.
    /// Returns `None` if this member has no copy.
    pub async fn read(
        &self,
        namespace: &Namespace,
        id: &DocumentId,
    ) -> Result<Option<Document>, NodeError> {
        Ok(self
            .read_with_report(namespace, id)
            .await?
            .map(|collected| collected.document))
    }

    /// Like [`read`](Self::read), also returning the collection report.
    pub async fn read_with_report(
        &self,
        namespace: &Namespace,
        id: &DocumentId,
    ) -> Result<Option<Collected>, NodeError> {
        let target = SplitTarget::new(namespace.clone(), id.clone());
        let Some(local) = self.store.get(&target).await? else {
            return Ok(None);
        };
        let collected = self.collector.collect(&local, &target).await?;
        Ok(Some(collected))
    }

    /// The split this member holds for `target`, as served to peers.
    ///
    /// A member only ever holds its own split, so any other `index` is a
    /// miss.
    pub async fn split_for(
        &self,
        target: &SplitTarget,
        index: usize,
    ) -> Result<Option<Bytes>, NodeError> {
        if index != self.self_index {
            debug!(%target, index, self_index = self.self_index, "split index not held here");
            return Ok(None);
        }
        let Some(local) = self.store.get(target).await? else {
            return Ok(None);
        };
        let split = self.codec.split_of(&local, index)?;
        Ok(Some(split.data))
    }
}

#[async_trait::async_trait]
impl SplitProvider for ReplicaNode {
    async fn split(
        &self,
        target: &SplitTarget,
        index: usize,
    ) -> Result<Option<Bytes>, ProviderError> {
        Ok(self.split_for(target, index).await?)
    }
}
