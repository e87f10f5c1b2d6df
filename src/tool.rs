//! Retrieval tools exposed to the language model.
//!
//! [`CourseSearchTool`] runs filtered passage search with fuzzy course-name
//! matching; [`CourseOutlineTool`] returns a course's lesson structure. Both
//! return their citations on the [`ToolOutput`] value rather than parking
//! them in shared state, so concurrent turns cannot leak sources into each
//! other.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::document::Source;
use crate::error::{RagError, Result};
use crate::store::SemanticStore;

/// The outcome of one tool invocation: text for the model plus citations for
/// the end user.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Formatted text fed back to the model as the tool result.
    pub text: String,
    /// One citation per formatted result, in result order.
    pub sources: Vec<Source>,
}

impl ToolOutput {
    /// An output with text and no sources.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self { text: text.into(), sources: Vec::new() }
    }
}

/// A named capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's unique name.
    fn name(&self) -> &str;

    /// What the tool does, phrased for the model.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's parameters, exposed to the model verbatim.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given JSON arguments.
    async fn execute(&self, args: Value) -> Result<ToolOutput>;
}

fn required_str(args: &Value, key: &str) -> Result<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| RagError::Config(format!("missing required '{key}' parameter")))
}

/// Searches course content with fuzzy course-name matching and optional
/// lesson filtering.
pub struct CourseSearchTool {
    store: Arc<SemanticStore>,
}

impl CourseSearchTool {
    /// Create a search tool backed by the given store.
    pub fn new(store: Arc<SemanticStore>) -> Self {
        Self { store }
    }

    /// The "no results" sentence, naming any filters that were applied.
    fn empty_message(course: Option<&str>, lesson: Option<u64>) -> String {
        let mut message = String::from("No relevant content found");
        if let Some(course) = course {
            message.push_str(&format!(" in course '{course}'"));
        }
        if let Some(lesson) = lesson {
            message.push_str(&format!(" in lesson {lesson}"));
        }
        message.push('.');
        message
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn name(&self) -> &str {
        "search_course_content"
    }

    fn description(&self) -> &str {
        "Search course materials with smart course name matching and lesson filtering"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for in the course content"
                },
                "course_name": {
                    "type": "string",
                    "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                },
                "lesson_number": {
                    "type": "integer",
                    "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput> {
        let query = required_str(&args, "query")?;
        let course = args.get("course_name").and_then(Value::as_str).map(String::from);
        let lesson_arg = args.get("lesson_number").and_then(Value::as_u64);

        info!(query = %query, course = course.as_deref(), lesson = lesson_arg, "search tool called");

        // A lesson number outside u32 range cannot match any chunk; report
        // an empty result instead of truncating into a wrong filter.
        let lesson = match lesson_arg.map(u32::try_from).transpose() {
            Ok(lesson) => lesson,
            Err(_) => {
                return Ok(ToolOutput::text_only(Self::empty_message(
                    course.as_deref(),
                    lesson_arg,
                )));
            }
        };

        let hits = match self.store.search(&query, course.as_deref(), lesson, None).await {
            Ok(hits) => hits,
            // An unresolvable course name is a descriptive empty result for
            // the model, not a hard failure of the turn.
            Err(err @ RagError::Resolution { .. }) => {
                warn!(error = %err, "course name did not resolve");
                return Ok(ToolOutput::text_only(err.to_string()));
            }
            Err(err) => return Err(err),
        };

        if hits.is_empty() {
            return Ok(ToolOutput::text_only(Self::empty_message(course.as_deref(), lesson_arg)));
        }

        let mut formatted = Vec::with_capacity(hits.len());
        let mut sources = Vec::with_capacity(hits.len());
        for hit in &hits {
            let (header, label) = match hit.lesson_number {
                Some(n) => (
                    format!("[{} - Lesson {n}]", hit.course_title),
                    format!("{} - Lesson {n}", hit.course_title),
                ),
                None => (format!("[{}]", hit.course_title), hit.course_title.clone()),
            };
            let link = match hit.lesson_number {
                Some(n) => self.store.lesson_link(&hit.course_title, n).await?,
                None => self.store.course_link(&hit.course_title).await?,
            };
            formatted.push(format!("{header}\n{}", hit.text));
            sources.push(Source { label, link });
        }

        Ok(ToolOutput { text: formatted.join("\n\n"), sources })
    }
}

/// Returns the complete outline of a course: title, instructor, link, and
/// the numbered lesson list.
pub struct CourseOutlineTool {
    store: Arc<SemanticStore>,
}

impl CourseOutlineTool {
    /// Create an outline tool backed by the given store.
    pub fn new(store: Arc<SemanticStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn name(&self) -> &str {
        "get_course_outline"
    }

    fn description(&self) -> &str {
        "Get the complete outline of a course including all lessons"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "course_title": {
                    "type": "string",
                    "description": "The title of the course to get the outline for (partial matches work)"
                }
            },
            "required": ["course_title"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolOutput> {
        let fuzzy = required_str(&args, "course_title")?;

        let Some(title) = self.store.resolve_course_name(&fuzzy).await? else {
            return Ok(ToolOutput::text_only(format!("No course found matching '{fuzzy}'")));
        };
        let Some(course) = self.store.course(&title).await? else {
            return Ok(ToolOutput::text_only(format!(
                "Course '{fuzzy}' found but no metadata available"
            )));
        };

        let mut parts = vec![format!("**{}**", course.title)];
        if let Some(instructor) = &course.instructor {
            parts.push(format!("*Instructor: {instructor}*"));
        }
        if let Some(link) = &course.link {
            parts.push(format!("*Course Link: {link}*"));
        }
        if course.lessons.is_empty() {
            parts.push("\nNo lessons found for this course.".to_string());
        } else {
            parts.push(format!("\n**Course Outline ({} lessons):**", course.lessons.len()));
            for lesson in &course.lessons {
                let mut line = format!("{}. {}", lesson.number, lesson.title);
                if let Some(link) = &lesson.link {
                    line.push_str(&format!(" - [Link]({link})"));
                }
                parts.push(line);
            }
        }

        let source = Source { label: course.title.clone(), link: course.link.clone() };
        Ok(ToolOutput { text: parts.join("\n"), sources: vec![source] })
    }
}
