//! Dual-collection semantic store for courses and their content.
//!
//! Two independently-indexed collections back the store:
//!
//! - `course_catalog` — one entry per course, embedded from its title,
//!   instructor, and lesson list. Used to resolve fuzzy course references
//!   ("the AI course" → "Introduction to Artificial Intelligence").
//! - `course_content` — one entry per chunk, embedded from the chunk text.
//!   Used for passage retrieval, optionally restricted by course and lesson.
//!
//! Invariant: every `course_content` entry references a course present in
//! `course_catalog`. [`SemanticStore::add_chunks`] enforces this.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::document::{Course, CourseChunk, ScoredChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::{Entry, MetadataFilter, VectorStore};

/// Collection holding one entry per course.
pub const CATALOG_COLLECTION: &str = "course_catalog";
/// Collection holding one entry per content chunk.
pub const CONTENT_COLLECTION: &str = "course_content";

/// The dual-collection semantic layer over a [`VectorStore`] and an
/// [`EmbeddingProvider`].
pub struct SemanticStore {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    max_results: usize,
    resolution_max_distance: f32,
}

impl SemanticStore {
    /// Create a new semantic store.
    ///
    /// `max_results` caps content searches when the caller does not supply a
    /// limit; `resolution_max_distance` is the acceptance threshold for fuzzy
    /// course-name resolution.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        max_results: usize,
        resolution_max_distance: f32,
    ) -> Self {
        Self { store, embedder, max_results, resolution_max_distance }
    }

    /// The embedding text for a catalog entry: title, instructor, and the
    /// lesson list, so fuzzy references to any of them can resolve the course.
    fn catalog_text(course: &Course) -> String {
        let mut text = course.title.clone();
        if let Some(instructor) = &course.instructor {
            text.push(' ');
            text.push_str(instructor);
        }
        for lesson in &course.lessons {
            text.push_str(&format!(" Lesson {}: {}", lesson.number, lesson.title));
        }
        text
    }

    /// Upsert a course into the catalog. Idempotent on title: re-adding an
    /// already-present title is a no-op.
    pub async fn add_course(&self, course: &Course) -> Result<()> {
        if self.store.get(CATALOG_COLLECTION, &course.title).await?.is_some() {
            debug!(course = %course.title, "course already in catalog, skipping");
            return Ok(());
        }

        let text = Self::catalog_text(course);
        let embedding = self.embedder.embed(&text).await?;

        let mut metadata = HashMap::new();
        metadata.insert("title".to_string(), json!(course.title));
        if let Some(instructor) = &course.instructor {
            metadata.insert("instructor".to_string(), json!(instructor));
        }
        if let Some(link) = &course.link {
            metadata.insert("course_link".to_string(), json!(link));
        }
        metadata.insert("lessons".to_string(), json!(course.lessons));

        self.store
            .upsert(
                CATALOG_COLLECTION,
                &[Entry { id: course.title.clone(), text, embedding, metadata }],
            )
            .await?;
        info!(course = %course.title, lessons = course.lessons.len(), "added course to catalog");
        Ok(())
    }

    /// Upsert content chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Store`] if any chunk references a course title
    /// absent from the catalog.
    pub async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        for chunk in chunks {
            if self.store.get(CATALOG_COLLECTION, &chunk.course_title).await?.is_none() {
                return Err(RagError::Store(format!(
                    "chunk references unknown course '{}'",
                    chunk.course_title
                )));
            }
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let entries: Vec<Entry> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| {
                let mut metadata = HashMap::new();
                metadata.insert("course_title".to_string(), json!(chunk.course_title));
                if let Some(n) = chunk.lesson_number {
                    metadata.insert("lesson_number".to_string(), json!(n));
                }
                metadata.insert("chunk_index".to_string(), json!(chunk.chunk_index));
                Entry {
                    id: format!("{}::{}", chunk.course_title, chunk.chunk_index),
                    text: chunk.text.clone(),
                    embedding,
                    metadata,
                }
            })
            .collect();

        self.store.upsert(CONTENT_COLLECTION, &entries).await?;
        info!(chunks = entries.len(), "added content chunks");
        Ok(())
    }

    /// Resolve a fuzzy course name to the exact catalog title, or `None`
    /// when no course is within the acceptance threshold.
    pub async fn resolve_course_name(&self, fuzzy_name: &str) -> Result<Option<String>> {
        let embedding = self.embedder.embed(fuzzy_name).await?;
        let nearest = self.store.search(CATALOG_COLLECTION, &embedding, 1, None).await?;

        let resolved = nearest
            .into_iter()
            .next()
            .filter(|hit| hit.distance <= self.resolution_max_distance)
            .map(|hit| hit.entry.id);
        debug!(fuzzy = fuzzy_name, resolved = resolved.as_deref(), "resolved course name");
        Ok(resolved)
    }

    /// Search course content, optionally restricted by a fuzzy course name
    /// and a lesson number.
    ///
    /// A supplied course filter is resolved first via
    /// [`resolve_course_name`](Self::resolve_course_name); resolution failure
    /// fails fast with [`RagError::Resolution`]. An empty result set is not
    /// an error.
    pub async fn search(
        &self,
        query: &str,
        course: Option<&str>,
        lesson: Option<u32>,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredChunk>> {
        let mut filter = MetadataFilter::new();
        if let Some(fuzzy) = course {
            let title = self
                .resolve_course_name(fuzzy)
                .await?
                .ok_or_else(|| RagError::Resolution { name: fuzzy.to_string() })?;
            filter = filter.with("course_title", title);
        }
        if let Some(n) = lesson {
            filter = filter.with("lesson_number", n);
        }
        let filter = (course.is_some() || lesson.is_some()).then_some(filter);

        let embedding = self.embedder.embed(query).await?;
        let limit = limit.unwrap_or(self.max_results);
        let hits =
            self.store.search(CONTENT_COLLECTION, &embedding, limit, filter.as_ref()).await?;
        debug!(query, hits = hits.len(), "content search completed");

        Ok(hits
            .into_iter()
            .map(|hit| ScoredChunk {
                text: hit.entry.text,
                course_title: metadata_str(&hit.entry.metadata, "course_title"),
                lesson_number: hit
                    .entry
                    .metadata
                    .get("lesson_number")
                    .and_then(Value::as_u64)
                    .map(|n| n as u32),
                distance: hit.distance,
            })
            .collect())
    }

    /// Course titles currently in the catalog, used by ingestion to skip
    /// re-processing.
    pub async fn existing_course_titles(&self) -> Result<Vec<String>> {
        let mut titles = self.store.list_ids(CATALOG_COLLECTION).await?;
        titles.sort();
        Ok(titles)
    }

    /// The full parsed [`Course`] for an exact catalog title, when present.
    pub async fn course(&self, title: &str) -> Result<Option<Course>> {
        let Some(entry) = self.store.get(CATALOG_COLLECTION, title).await? else {
            return Ok(None);
        };
        let lessons = entry
            .metadata
            .get("lessons")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| RagError::Store(format!("malformed lesson metadata: {e}")))?
            .unwrap_or_default();
        Ok(Some(Course {
            title: entry.id,
            instructor: entry.metadata.get("instructor").and_then(Value::as_str).map(String::from),
            link: entry.metadata.get("course_link").and_then(Value::as_str).map(String::from),
            lessons,
        }))
    }

    /// The external link for an exact course title, when known.
    pub async fn course_link(&self, title: &str) -> Result<Option<String>> {
        Ok(self.course(title).await?.and_then(|c| c.link))
    }

    /// The external link for one lesson of an exact course title, when known.
    pub async fn lesson_link(&self, title: &str, lesson: u32) -> Result<Option<String>> {
        Ok(self
            .course(title)
            .await?
            .and_then(|c| c.lessons.into_iter().find(|l| l.number == lesson))
            .and_then(|l| l.link))
    }
}

fn metadata_str(metadata: &HashMap<String, Value>, key: &str) -> String {
    metadata.get(key).and_then(Value::as_str).unwrap_or("unknown").to_string()
}
