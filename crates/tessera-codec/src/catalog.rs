//! Index catalog: decides which fields stay plaintext.

use std::collections::BTreeSet;

/// Answers whether a field participates in an index.
///
/// Indexed fields are replicated as-is so they remain queryable; every
/// other field goes into the erasure-coded payload.
pub trait IndexCatalog: Send + Sync {
    /// Whether `field` participates in any index.
    fn is_field_indexed(&self, field: &str) -> bool;
}

impl<F> IndexCatalog for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_field_indexed(&self, field: &str) -> bool {
        self(field)
    }
}

/// An index catalog backed by a fixed set of field names.
#[derive(Debug, Clone, Default)]
pub struct StaticIndexCatalog {
    fields: BTreeSet<String>,
}

impl StaticIndexCatalog {
    /// Create a catalog indexing exactly the given fields.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a field to the catalog.
    pub fn add(&mut self, field: impl Into<String>) {
        self.fields.insert(field.into());
    }

    /// Indexed field names, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

impl IndexCatalog for StaticIndexCatalog {
    fn is_field_indexed(&self, field: &str) -> bool {
        self.fields.contains(field)
    }
}
