//! Local storage of encoded documents.

use std::collections::HashMap;
use std::sync::RwLock;

use tessera_types::{Document, SplitTarget};
use tracing::debug;

use crate::error::NodeError;

/// Trait for storing encoded documents keyed by namespace and id.
///
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store (or replace) a document.
    async fn put(&self, target: &SplitTarget, document: Document) -> Result<(), NodeError>;

    /// Retrieve a document. Returns `None` if not found.
    async fn get(&self, target: &SplitTarget) -> Result<Option<Document>, NodeError>;

    /// Delete a document. Deleting a missing document is not an error.
    async fn delete(&self, target: &SplitTarget) -> Result<(), NodeError>;

    /// Number of stored documents.
    async fn len(&self) -> Result<usize, NodeError>;

    /// Whether the store holds no documents.
    async fn is_empty(&self) -> Result<bool, NodeError> {
        Ok(self.len().await? == 0)
    }
}

/// In-memory document store backed by a `RwLock<HashMap>`.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<SplitTarget, Document>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, target: &SplitTarget, document: Document) -> Result<(), NodeError> {
        let mut map = self.documents.write().expect("lock poisoned");
        debug!(%target, fields = document.len(), "storing document in memory");
        map.insert(target.clone(), document);
        Ok(())
    }

    async fn get(&self, target: &SplitTarget) -> Result<Option<Document>, NodeError> {
        let map = self.documents.read().expect("lock poisoned");
        Ok(map.get(target).cloned())
    }

    async fn delete(&self, target: &SplitTarget) -> Result<(), NodeError> {
        let mut map = self.documents.write().expect("lock poisoned");
        map.remove(target);
        debug!(%target, "deleted document from memory");
        Ok(())
    }

    async fn len(&self) -> Result<usize, NodeError> {
        let map = self.documents.read().expect("lock poisoned");
        Ok(map.len())
    }
}
