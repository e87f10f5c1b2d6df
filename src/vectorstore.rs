//! Vector store trait for storing and searching embedded entries.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// An embedded entry stored in a named collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Unique identifier within the collection. Upserting an existing ID
    /// replaces the previous entry.
    pub id: String,
    /// The entry's text.
    pub text: String,
    /// The vector embedding for the entry's text.
    pub embedding: Vec<f32>,
    /// Key-value metadata used for exact-match filtering and source lookup.
    pub metadata: HashMap<String, Value>,
}

/// An exact-match metadata filter: every (key, value) pair must match.
#[derive(Debug, Clone, Default)]
pub struct MetadataFilter {
    clauses: Vec<(String, Value)>,
}

impl MetadataFilter {
    /// Create an empty filter that matches every entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to equal `value` exactly.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((key.into(), value.into()));
        self
    }

    /// Whether the given metadata satisfies every clause.
    pub fn matches(&self, metadata: &HashMap<String, Value>) -> bool {
        self.clauses.iter().all(|(key, value)| metadata.get(key) == Some(value))
    }
}

/// A retrieved [`Entry`] paired with its distance from the query embedding.
/// Lower distance means more relevant.
#[derive(Debug, Clone)]
pub struct Scored {
    /// The retrieved entry.
    pub entry: Entry,
    /// Cosine distance from the query embedding, in `[0.0, 2.0]`.
    pub distance: f32,
}

/// A storage backend for embedded entries with filtered similarity search.
///
/// Collections are created implicitly on first upsert. Reading from a
/// collection that was never written yields empty results rather than an
/// error, so an empty corpus is queryable.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upsert entries into a collection, creating it if absent.
    /// Entries must have embeddings set.
    async fn upsert(&self, collection: &str, entries: &[Entry]) -> Result<()>;

    /// Fetch a single entry by ID. Returns `None` for unknown IDs or
    /// collections.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Entry>>;

    /// List all entry IDs in a collection.
    async fn list_ids(&self, collection: &str) -> Result<Vec<String>>;

    /// Search for the `limit` entries nearest to the given embedding,
    /// restricted to entries matching `filter` when one is supplied.
    ///
    /// Returns results ordered by ascending distance.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Scored>>;
}
