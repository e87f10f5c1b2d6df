//! In-memory vector store using cosine distance.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency vector
//! store backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is
//! suitable for development, testing, and corpora that fit in memory.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::vectorstore::{Entry, MetadataFilter, Scored, VectorStore};

/// An in-memory vector store using cosine distance for search.
///
/// Collections are stored as nested `HashMap`s: collection name → entry ID →
/// entry. All operations are async-safe via `tokio::sync::RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, HashMap<String, Entry>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine distance (`1 - cosine similarity`) between two vectors.
///
/// Returns 1.0 (orthogonal) if either vector has zero magnitude.
fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, collection: &str, entries: &[Entry]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.entry(collection.to_string()).or_default();
        for entry in entries {
            store.insert(entry.id.clone(), entry.clone());
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Entry>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|store| store.get(id)).cloned())
    }

    async fn list_ids(&self, collection: &str) -> Result<Vec<String>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|store| store.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<Scored>> {
        let collections = self.collections.read().await;
        let Some(store) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<Scored> = store
            .values()
            .filter(|entry| filter.map_or(true, |f| f.matches(&entry.metadata)))
            .map(|entry| Scored {
                entry: entry.clone(),
                distance: cosine_distance(&entry.embedding, embedding),
            })
            .collect();

        scored
            .sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, embedding: Vec<f32>, course: &str, lesson: Option<u32>) -> Entry {
        let mut metadata = HashMap::new();
        metadata.insert("course_title".to_string(), json!(course));
        if let Some(n) = lesson {
            metadata.insert("lesson_number".to_string(), json!(n));
        }
        Entry { id: id.to_string(), text: format!("text for {id}"), embedding, metadata }
    }

    #[tokio::test]
    async fn search_on_missing_collection_is_empty() {
        let store = InMemoryVectorStore::new();
        let results = store.search("nowhere", &[1.0, 0.0], 5, None).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_orders_by_ascending_distance() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(
                "content",
                &[
                    entry("far", vec![0.0, 1.0], "A", None),
                    entry("near", vec![1.0, 0.1], "A", None),
                ],
            )
            .await
            .unwrap();

        let results = store.search("content", &[1.0, 0.0], 5, None).await.unwrap();
        assert_eq!(results[0].entry.id, "near");
        assert!(results[0].distance < results[1].distance);
    }

    #[tokio::test]
    async fn filter_restricts_results() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(
                "content",
                &[
                    entry("a1", vec![1.0, 0.0], "A", Some(1)),
                    entry("a2", vec![1.0, 0.0], "A", Some(2)),
                    entry("b1", vec![1.0, 0.0], "B", Some(1)),
                ],
            )
            .await
            .unwrap();

        let filter = MetadataFilter::new().with("course_title", "A").with("lesson_number", 1);
        let results = store.search("content", &[1.0, 0.0], 5, Some(&filter)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry.id, "a1");
    }

    #[tokio::test]
    async fn upsert_replaces_existing_id() {
        let store = InMemoryVectorStore::new();
        store.upsert("content", &[entry("x", vec![1.0, 0.0], "A", None)]).await.unwrap();
        store.upsert("content", &[entry("x", vec![0.0, 1.0], "A", None)]).await.unwrap();

        assert_eq!(store.list_ids("content").await.unwrap().len(), 1);
        let fetched = store.get("content", "x").await.unwrap().unwrap();
        assert_eq!(fetched.embedding, vec![0.0, 1.0]);
    }
}
