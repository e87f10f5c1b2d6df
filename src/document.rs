//! Data types for courses, chunks, search results, and turn exchanges.

use serde::{Deserialize, Serialize};

/// A course parsed from one transcript document.
///
/// The title acts as the unique key across the corpus; there is no separate ID.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    /// Course title, unique across the corpus.
    pub title: String,
    /// Name of the instructor, when the document declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    /// Link to the course page, when the document declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Lessons in document order.
    pub lessons: Vec<Lesson>,
}

/// A single lesson within a [`Course`]. Created once at ingestion, immutable
/// thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lesson {
    /// Lesson number, unique within its course.
    pub number: u32,
    /// Lesson title.
    pub title: String,
    /// Link to the lesson page, when the document declares one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// A bounded, overlap-aware segment of course text prepared for indexing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseChunk {
    /// The chunk's stored text, prefixed with course/lesson context so it is
    /// self-describing when retrieved in isolation.
    pub text: String,
    /// Title of the owning course.
    pub course_title: String,
    /// Number of the owning lesson. `None` for content that precedes the
    /// first lesson marker.
    pub lesson_number: Option<u32>,
    /// Zero-based index, monotonic and continuous across lesson boundaries
    /// within one course.
    pub chunk_index: usize,
}

/// A retrieved chunk paired with its relevance distance.
///
/// Distances are cosine distances: lower is more relevant, and result sets
/// are ordered ascending.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The chunk's stored text.
    pub text: String,
    /// Title of the owning course.
    pub course_title: String,
    /// Number of the owning lesson, when the chunk belongs to one.
    pub lesson_number: Option<u32>,
    /// Cosine distance from the query embedding.
    pub distance: f32,
}

/// A citation surfaced to the end user identifying which course/lesson
/// grounded part of the answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Source {
    /// Human-readable label, e.g. `"Intro to X - Lesson 1"`.
    pub label: String,
    /// Link to the cited course or lesson page, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// One completed (query, answer) pair in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exchange {
    /// The user's query.
    pub query: String,
    /// The generated answer.
    pub answer: String,
}

/// The result of one orchestrated query turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// The final answer text.
    pub answer: String,
    /// Citations collected from tool dispatches during the turn, in dispatch
    /// order. Empty when no search occurred.
    pub sources: Vec<Source>,
    /// The session the exchange was recorded under. Newly created when the
    /// caller supplied none.
    pub session_id: String,
}

/// Corpus statistics exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseStats {
    /// Number of courses in the catalog.
    pub course_count: usize,
    /// Course titles, sorted.
    pub course_titles: Vec<String>,
}
