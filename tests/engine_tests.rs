//! End-to-end tests for the query orchestration loop, using an in-memory
//! store, a deterministic hash embedder, and a scripted chat model.

use std::sync::Arc;

use async_trait::async_trait;
use course_rag::{
    ChatModel, ChatRequest, ChatResponse, ContentBlock, InMemoryVectorStore, RagEngine, RagError,
    Result, StopReason,
};
use serde_json::json;
use tokio::sync::Mutex;

mod common;
use common::HashEmbedder;

/// A chat model that replays a fixed script of responses and records every
/// request it receives.
struct ScriptedModel {
    responses: Mutex<Vec<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    fn new(mut responses: Vec<ChatResponse>) -> Arc<Self> {
        responses.reverse();
        Arc::new(Self { responses: Mutex::new(responses), requests: Mutex::new(Vec::new()) })
    }

    async fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().await.push(request);
        self.responses.lock().await.pop().ok_or_else(|| RagError::Model {
            provider: "scripted".into(),
            message: "script exhausted".into(),
        })
    }
}

fn text_response(text: &str) -> ChatResponse {
    ChatResponse {
        content: vec![ContentBlock::Text { text: text.to_string() }],
        stop_reason: StopReason::EndTurn,
    }
}

fn tool_use_response(name: &str, input: serde_json::Value) -> ChatResponse {
    ChatResponse {
        content: vec![ContentBlock::ToolUse {
            id: "tu_1".to_string(),
            name: name.to_string(),
            input,
        }],
        stop_reason: StopReason::ToolUse,
    }
}

fn engine_with(model: Arc<ScriptedModel>) -> RagEngine {
    RagEngine::builder()
        .embedding_provider(Arc::new(HashEmbedder))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .model(model)
        .build()
        .unwrap()
}

const DOC: &str = "\
Course Title: Intro to X
Course Link: https://example.com/intro-x
Instructor: Grace Hopper

Lesson 1: Getting Started
Lesson Link: https://example.com/intro-x/lesson-1
Welcome to the course. We begin with the fundamentals of X and why it matters.

Lesson 2: Going Deeper
This lesson covers advanced topics in X, including composition and reuse.
";

#[tokio::test]
async fn search_turn_returns_answer_and_sources() {
    let model = ScriptedModel::new(vec![
        tool_use_response(
            "search_course_content",
            json!({"query": "fundamentals", "lesson_number": 1}),
        ),
        text_response("X is introduced in lesson 1."),
    ]);
    let engine = engine_with(Arc::clone(&model));
    engine.ingest_document(DOC).await.unwrap();

    let outcome =
        engine.handle_turn("What is covered in lesson 1 of Intro to X?", None).await.unwrap();

    assert_eq!(outcome.answer, "X is introduced in lesson 1.");
    assert_eq!(outcome.sources.len(), 1);
    assert_eq!(outcome.sources[0].label, "Intro to X - Lesson 1");
    assert_eq!(
        outcome.sources[0].link.as_deref(),
        Some("https://example.com/intro-x/lesson-1")
    );

    // The tool result fed back to the model is headed with course and lesson.
    let requests = model.requests().await;
    assert_eq!(requests.len(), 2);
    let tool_result = &requests[1].messages[2];
    match &tool_result.content[0] {
        ContentBlock::ToolResult { content, .. } => {
            assert!(content.contains("[Intro to X - Lesson 1]"));
        }
        other => panic!("expected tool result, got {other:?}"),
    }
}

#[tokio::test]
async fn follow_up_call_offers_no_tools() {
    let model = ScriptedModel::new(vec![
        tool_use_response("search_course_content", json!({"query": "anything"})),
        text_response("done"),
    ]);
    let engine = engine_with(Arc::clone(&model));
    engine.ingest_document(DOC).await.unwrap();

    engine.handle_turn("anything", None).await.unwrap();

    let requests = model.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].tools.is_empty());
    assert!(requests[1].tools.is_empty());
}

#[tokio::test]
async fn direct_answer_skips_tools_and_sources() {
    let model = ScriptedModel::new(vec![text_response("2 + 2 = 4")]);
    let engine = engine_with(Arc::clone(&model));

    let outcome = engine.handle_turn("What is 2 + 2?", None).await.unwrap();

    assert_eq!(outcome.answer, "2 + 2 = 4");
    assert!(outcome.sources.is_empty());
    assert_eq!(model.requests().await.len(), 1);
}

#[tokio::test]
async fn empty_corpus_search_reports_no_content() {
    let model = ScriptedModel::new(vec![
        tool_use_response("search_course_content", json!({"query": "anything"})),
        text_response("I could not find relevant content."),
    ]);
    let engine = engine_with(Arc::clone(&model));

    let outcome = engine.handle_turn("anything", None).await.unwrap();

    assert!(outcome.sources.is_empty());
    let requests = model.requests().await;
    match &requests[1].messages[2].content[0] {
        ContentBlock::ToolResult { content, .. } => {
            assert_eq!(content, "No relevant content found.");
        }
        other => panic!("expected tool result, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_tool_becomes_failure_text_not_error() {
    let model = ScriptedModel::new(vec![
        tool_use_response("no_such_tool", json!({})),
        text_response("Something went wrong."),
    ]);
    let engine = engine_with(Arc::clone(&model));

    let outcome = engine.handle_turn("anything", None).await.unwrap();
    assert_eq!(outcome.answer, "Something went wrong.");

    let requests = model.requests().await;
    match &requests[1].messages[2].content[0] {
        ContentBlock::ToolResult { content, .. } => {
            assert!(content.starts_with("Tool execution failed:"));
        }
        other => panic!("expected tool result, got {other:?}"),
    }
}

#[tokio::test]
async fn outline_turn_cites_the_course() {
    let model = ScriptedModel::new(vec![
        tool_use_response("get_course_outline", json!({"course_title": "Intro to X"})),
        text_response("The course has two lessons."),
    ]);
    let engine = engine_with(Arc::clone(&model));
    engine.ingest_document(DOC).await.unwrap();

    let outcome = engine.handle_turn("What does the intro course cover?", None).await.unwrap();

    assert_eq!(outcome.sources.len(), 1);
    assert_eq!(outcome.sources[0].label, "Intro to X");
    assert_eq!(outcome.sources[0].link.as_deref(), Some("https://example.com/intro-x"));

    let requests = model.requests().await;
    match &requests[1].messages[2].content[0] {
        ContentBlock::ToolResult { content, .. } => {
            assert!(content.contains("**Intro to X**"));
            assert!(content.contains("1. Getting Started"));
            assert!(content.contains("2. Going Deeper"));
        }
        other => panic!("expected tool result, got {other:?}"),
    }
}

#[tokio::test]
async fn history_is_threaded_into_later_turns() {
    let model = ScriptedModel::new(vec![
        text_response("first answer"),
        text_response("second answer"),
    ]);
    let engine = engine_with(Arc::clone(&model));

    let first = engine.handle_turn("first question", None).await.unwrap();
    engine.handle_turn("second question", Some(&first.session_id)).await.unwrap();

    let requests = model.requests().await;
    assert!(!requests[0].system.contains("Previous conversation:"));
    assert!(requests[1].system.contains("Previous conversation:"));
    assert!(requests[1].system.contains("User: first question"));
    assert!(requests[1].system.contains("Assistant: first answer"));
}

#[tokio::test]
async fn model_failure_propagates_as_error() {
    // Script only one response: the follow-up model call fails.
    let model = ScriptedModel::new(vec![
        tool_use_response("search_course_content", json!({"query": "x"})),
    ]);
    let engine = engine_with(Arc::clone(&model));
    engine.ingest_document(DOC).await.unwrap();

    let err = engine.handle_turn("doomed question", None).await.unwrap_err();
    assert!(matches!(err, RagError::Model { .. }));
}

#[tokio::test]
async fn cleared_session_forgets_history() {
    let model = ScriptedModel::new(vec![
        text_response("first answer"),
        text_response("second answer"),
    ]);
    let engine = engine_with(Arc::clone(&model));

    let first = engine.handle_turn("first question", None).await.unwrap();
    engine.clear_session(&first.session_id).await.unwrap();
    engine.handle_turn("second question", Some(&first.session_id)).await.unwrap();

    let requests = model.requests().await;
    assert!(!requests[1].system.contains("Previous conversation:"));
}
