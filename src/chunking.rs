//! Course transcript parsing and sentence-aligned chunking.
//!
//! A transcript document carries a leading metadata block followed by lesson
//! sections:
//!
//! ```text
//! Course Title: Introduction to Artificial Intelligence
//! Course Link: https://example.com/ai
//! Instructor: Ada Lovelace
//!
//! Lesson 1: Getting Started
//! Lesson Link: https://example.com/ai/lesson1
//! Welcome to the course. ...
//! ```
//!
//! [`DocumentChunker::process`] turns one such document into a [`Course`] plus
//! an ordered sequence of [`CourseChunk`]s whose indices run continuously
//! across lesson boundaries.

use tracing::debug;

use crate::document::{Course, CourseChunk, Lesson};
use crate::error::{RagError, Result};

/// Splits transcript text into overlapping, sentence-aligned chunks and
/// extracts course/lesson structure from headers.
#[derive(Debug, Clone)]
pub struct DocumentChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

/// One lesson section's text, plus the preamble section with no lesson.
struct Section {
    lesson_number: Option<u32>,
    text: String,
}

impl DocumentChunker {
    /// Create a new `DocumentChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of trailing characters shared with the next chunk
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Parse a raw transcript into a [`Course`] and its ordered chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Parse`] if no `Course Title:` line is found before
    /// the first lesson marker.
    pub fn process(&self, raw_text: &str) -> Result<(Course, Vec<CourseChunk>)> {
        let (course, sections) = parse_structure(raw_text)?;

        let mut chunks = Vec::new();
        let mut chunk_index = 0;
        for section in &sections {
            let sentences = split_sentences(&section.text);
            // A lesson with no sentences yields no chunk for it.
            if sentences.is_empty() {
                continue;
            }
            for group in group_sentences(&sentences, self.chunk_size, self.chunk_overlap) {
                let text = match section.lesson_number {
                    Some(n) => format!("Course {} Lesson {n} content: {group}", course.title),
                    None => format!("Course {} content: {group}", course.title),
                };
                chunks.push(CourseChunk {
                    text,
                    course_title: course.title.clone(),
                    lesson_number: section.lesson_number,
                    chunk_index,
                });
                chunk_index += 1;
            }
        }

        debug!(course = %course.title, lessons = course.lessons.len(), chunks = chunks.len(), "processed document");
        Ok((course, chunks))
    }
}

/// Extract a metadata value from a line-anchored `Key: value` line.
fn metadata_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.trim().strip_prefix(key)?;
    Some(rest.trim())
}

/// Parse a `Lesson <N>: <title>` marker line.
fn parse_lesson_marker(line: &str) -> Option<(u32, String)> {
    let rest = line.trim().strip_prefix("Lesson ")?;
    let colon = rest.find(':')?;
    let number: u32 = rest[..colon].trim().parse().ok()?;
    let title = rest[colon + 1..].trim().to_string();
    if title.is_empty() {
        return None;
    }
    Some((number, title))
}

/// Parse the metadata block and lesson sections of one document.
fn parse_structure(raw_text: &str) -> Result<(Course, Vec<Section>)> {
    let mut title = None;
    let mut link = None;
    let mut instructor = None;
    let mut lessons = Vec::new();
    let mut sections: Vec<Section> = Vec::new();

    // Current section under construction. Starts as the preamble, which owns
    // text that precedes any lesson marker.
    let mut current = Section { lesson_number: None, text: String::new() };
    let mut seen_lesson = false;

    let mut lines = raw_text.lines().peekable();
    while let Some(line) = lines.next() {
        if let Some((number, lesson_title)) = parse_lesson_marker(line) {
            sections.push(current);
            current = Section { lesson_number: Some(number), text: String::new() };
            seen_lesson = true;

            // An optional `Lesson Link:` line may directly follow the marker.
            let lesson_link = lines
                .peek()
                .and_then(|next| metadata_value(next, "Lesson Link:"))
                .map(str::to_string);
            if lesson_link.is_some() {
                lines.next();
            }
            lessons.push(Lesson { number, title: lesson_title, link: lesson_link });
            continue;
        }

        if !seen_lesson {
            if let Some(value) = metadata_value(line, "Course Title:") {
                title.get_or_insert_with(|| value.to_string());
                continue;
            }
            if let Some(value) = metadata_value(line, "Course Link:") {
                link.get_or_insert_with(|| value.to_string());
                continue;
            }
            if let Some(value) = metadata_value(line, "Instructor:") {
                instructor.get_or_insert_with(|| value.to_string());
                continue;
            }
        }

        current.text.push_str(line);
        current.text.push('\n');
    }
    sections.push(current);

    let title = title
        .ok_or_else(|| RagError::Parse("no 'Course Title:' line found in document".to_string()))?;

    let course = Course { title, instructor, link, lessons };
    Ok((course, sections))
}

/// Words that end with a period without ending a sentence.
const ABBREVIATIONS: &[&str] =
    &["mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "fig", "no", "al"];

/// The word immediately preceding a candidate sentence boundary.
fn last_word(text: &str) -> &str {
    let word = text.rsplit(char::is_whitespace).next().unwrap_or("");
    word.trim_start_matches(|c: char| c.is_ascii_punctuation())
}

/// Whether a period after `word` marks an abbreviation rather than a
/// sentence boundary. Covers initials ("A."), dotted abbreviations
/// ("e.g.", "U.S."), and common titles ("Dr.").
fn is_abbreviation(word: &str) -> bool {
    if word.is_empty() || word.contains('.') {
        return true;
    }
    let mut chars = word.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        if first.is_alphabetic() {
            return true;
        }
    }
    ABBREVIATIONS.contains(&word.to_ascii_lowercase().as_str())
}

/// Split text into sentences on `.`, `!`, and `?` boundaries followed by
/// whitespace, without splitting on abbreviations or decimal numbers.
///
/// Whitespace is normalized first, so sentences never span hard line breaks.
pub fn split_sentences(text: &str) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Vec::new();
    }

    let mut sentences = Vec::new();
    let mut start = 0;
    let chars: Vec<(usize, char)> = normalized.char_indices().collect();

    for k in 0..chars.len() {
        let (i, c) = chars[k];
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        // Decimal points and mid-token periods have no following whitespace.
        if chars.get(k + 1).map(|&(_, next)| next) != Some(' ') {
            continue;
        }
        if c == '.' && is_abbreviation(last_word(&normalized[start..i])) {
            continue;
        }
        let end = i + c.len_utf8();
        sentences.push(normalized[start..end].trim().to_string());
        start = end;
    }

    let tail = normalized[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Group sentences into chunks of up to `chunk_size` characters, sliding
/// forward so consecutive chunks share a trailing window of roughly
/// `chunk_overlap` characters. A final partial group still becomes its own
/// chunk; no sentence is dropped.
fn group_sentences(sentences: &[String], chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < sentences.len() {
        let mut end = start;
        let mut len = 0;
        while end < sentences.len() {
            let added = sentences[end].len() + usize::from(len > 0);
            if len + added > chunk_size && end > start {
                break;
            }
            len += added;
            end += 1;
        }

        chunks.push(sentences[start..end].join(" "));
        if end >= sentences.len() {
            break;
        }

        // Walk back from the end of this chunk until the trailing window
        // covers the overlap, always advancing by at least one sentence.
        let mut next = end;
        let mut trailing = 0;
        while next > start + 1 && trailing < chunk_overlap {
            next -= 1;
            trailing += sentences[next].len() + 1;
        }
        start = next;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Course Title: Intro to X
Course Link: https://example.com/x
Instructor: Jane Doe

Lesson 1: Getting Started
Lesson Link: https://example.com/x/1
Welcome to the course. This lesson covers the basics. We will move quickly.

Lesson 2: Going Deeper
This lesson builds on lesson one. It covers advanced material.
";

    fn chunker() -> DocumentChunker {
        DocumentChunker::new(800, 100)
    }

    #[test]
    fn parses_course_metadata() {
        let (course, _) = chunker().process(SAMPLE).unwrap();
        assert_eq!(course.title, "Intro to X");
        assert_eq!(course.link.as_deref(), Some("https://example.com/x"));
        assert_eq!(course.instructor.as_deref(), Some("Jane Doe"));
        assert_eq!(course.lessons.len(), 2);
        assert_eq!(course.lessons[0].number, 1);
        assert_eq!(course.lessons[0].title, "Getting Started");
        assert_eq!(course.lessons[0].link.as_deref(), Some("https://example.com/x/1"));
        assert_eq!(course.lessons[1].number, 2);
        assert!(course.lessons[1].link.is_none());
    }

    #[test]
    fn missing_title_is_a_parse_error() {
        let err = chunker().process("Some text without any header.\n").unwrap_err();
        assert!(matches!(err, RagError::Parse(_)));
    }

    #[test]
    fn chunk_indices_are_continuous_across_lessons() {
        let (_, chunks) = chunker().process(SAMPLE).unwrap();
        assert!(!chunks.is_empty());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
        }
        // Both lessons produced content.
        assert!(chunks.iter().any(|c| c.lesson_number == Some(1)));
        assert!(chunks.iter().any(|c| c.lesson_number == Some(2)));
    }

    #[test]
    fn chunk_text_is_self_describing() {
        let (_, chunks) = chunker().process(SAMPLE).unwrap();
        assert!(chunks[0].text.starts_with("Course Intro to X Lesson 1 content: "));
    }

    #[test]
    fn preamble_text_belongs_to_no_lesson() {
        let doc = "Course Title: Intro to X\n\nAn overview sentence before lessons.\n\nLesson 1: Start\nLesson one content here.\n";
        let (_, chunks) = chunker().process(doc).unwrap();
        assert_eq!(chunks[0].lesson_number, None);
        assert!(chunks[0].text.starts_with("Course Intro to X content: "));
        assert_eq!(chunks[1].lesson_number, Some(1));
    }

    #[test]
    fn empty_lesson_yields_no_chunk() {
        let doc = "Course Title: Intro to X\n\nLesson 1: Empty\n\nLesson 2: Full\nThis lesson has content.\n";
        let (course, chunks) = chunker().process(doc).unwrap();
        assert_eq!(course.lessons.len(), 2);
        assert!(chunks.iter().all(|c| c.lesson_number == Some(2)));
    }

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        let sentences = split_sentences("First sentence. Second one! Third one? Fourth.");
        assert_eq!(
            sentences,
            vec!["First sentence.", "Second one!", "Third one?", "Fourth."]
        );
    }

    #[test]
    fn sentences_do_not_split_on_abbreviations() {
        let sentences = split_sentences("Dr. Smith teaches the course. It is good.");
        assert_eq!(sentences, vec!["Dr. Smith teaches the course.", "It is good."]);

        let sentences = split_sentences("Use tools, e.g. a compiler. Then build.");
        assert_eq!(sentences, vec!["Use tools, e.g. a compiler.", "Then build."]);
    }

    #[test]
    fn sentences_do_not_split_on_decimals() {
        let sentences = split_sentences("Pi is roughly 3.14 in value. Next sentence.");
        assert_eq!(sentences, vec!["Pi is roughly 3.14 in value.", "Next sentence."]);
    }

    #[test]
    fn grouping_covers_every_sentence_in_order() {
        let sentences: Vec<String> =
            (0..40).map(|i| format!("Sentence number {i} with some padding words.")).collect();
        let chunks = group_sentences(&sentences, 200, 50);
        assert!(chunks.len() > 1);

        // Every sentence appears, and first occurrences are in order.
        let mut last_pos: usize = 0;
        for sentence in &sentences {
            let pos = chunks
                .iter()
                .position(|c| c.contains(sentence.as_str()))
                .unwrap_or_else(|| panic!("sentence missing from all chunks: {sentence}"));
            assert!(pos >= last_pos.saturating_sub(1));
            last_pos = pos;
        }
    }

    #[test]
    fn consecutive_chunks_share_trailing_sentences() {
        let sentences: Vec<String> =
            (0..20).map(|i| format!("Sentence number {i} with some padding words.")).collect();
        let chunks = group_sentences(&sentences, 200, 50);
        for window in chunks.windows(2) {
            let first_of_next = window[1].split(". ").next().unwrap();
            assert!(
                window[0].contains(first_of_next),
                "no overlap between '{}' and '{}'",
                window[0],
                window[1]
            );
        }
    }

    #[test]
    fn oversized_sentence_becomes_its_own_chunk() {
        let long = "x".repeat(500);
        let sentences = vec![long.clone(), "Short one.".to_string()];
        let chunks = group_sentences(&sentences, 100, 20);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], long);
    }

    #[test]
    fn final_partial_group_is_kept() {
        let sentences =
            vec!["A first sentence with words.".to_string(), "Tail.".to_string()];
        let chunks = group_sentences(&sentences, 28, 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.last().unwrap(), "Tail.");
    }
}
