//! The retrieval engine: ingestion plus tool-calling query orchestration.
//!
//! [`RagEngine`] wires the chunker, semantic store, tool registry, session
//! store, and language model together. A query turn makes at most one tool
//! round: the first model call offers the tool schemas, and the follow-up
//! call carries the tool results with an empty tool list, so a second search
//! is impossible by construction.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::chunking::DocumentChunker;
use crate::config::RagConfig;
use crate::document::{CourseStats, Exchange, Source, TurnOutcome};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::model::{ChatMessage, ChatModel, ChatRequest, ContentBlock};
use crate::registry::ToolRegistry;
use crate::session::{InMemorySessionStore, SessionStore};
use crate::store::SemanticStore;
use crate::tool::{CourseOutlineTool, CourseSearchTool};
use crate::vectorstore::VectorStore;

/// System instructions for the answering model.
const SYSTEM_PROMPT: &str = "\
You are an AI assistant specialized in course materials and educational content, \
with a search tool and a course outline tool.

Tool usage:
- Use the search tool for questions about specific course content or detailed educational materials
- Use the outline tool for questions about a course's structure: its title, link, and complete lesson list
- One tool call per query maximum
- If a search yields no results, state this clearly without offering alternatives

Responses:
- Answer general knowledge questions from your own knowledge without tools
- Be brief, concise and focused
- Do not mention the search process or that you used a tool
- For outline queries, include the course title, course link, and every lesson's number and title";

/// Counts of what an ingestion pass added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Courses newly added to the catalog.
    pub courses_added: usize,
    /// Content chunks newly indexed.
    pub chunks_added: usize,
}

/// The top-level retrieval engine.
pub struct RagEngine {
    config: RagConfig,
    chunker: DocumentChunker,
    store: Arc<SemanticStore>,
    registry: ToolRegistry,
    sessions: Arc<dyn SessionStore>,
    model: Arc<dyn ChatModel>,
}

impl std::fmt::Debug for RagEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagEngine").finish_non_exhaustive()
    }
}

impl RagEngine {
    /// Start building an engine.
    pub fn builder() -> RagEngineBuilder {
        RagEngineBuilder::default()
    }

    /// The semantic store backing this engine.
    pub fn store(&self) -> &Arc<SemanticStore> {
        &self.store
    }

    /// Parse one transcript document and index it. A document whose course
    /// title is already in the catalog is skipped entirely.
    pub async fn ingest_document(&self, raw_text: &str) -> Result<IngestReport> {
        let (course, chunks) = self.chunker.process(raw_text)?;

        let existing = self.store.existing_course_titles().await?;
        if existing.contains(&course.title) {
            info!(course = %course.title, "course already indexed, skipping");
            return Ok(IngestReport::default());
        }

        self.store.add_course(&course).await?;
        self.store.add_chunks(&chunks).await?;
        info!(course = %course.title, chunks = chunks.len(), "course indexed");
        Ok(IngestReport { courses_added: 1, chunks_added: chunks.len() })
    }

    /// Ingest every `.txt` file in a folder. Documents that fail to parse are
    /// logged and skipped; the rest of the folder is still processed.
    pub async fn ingest_folder(&self, folder: impl AsRef<Path>) -> Result<IngestReport> {
        let folder = folder.as_ref();
        let mut report = IngestReport::default();

        let mut dir = tokio::fs::read_dir(folder)
            .await
            .map_err(|e| RagError::Store(format!("cannot read folder {}: {e}", folder.display())))?;
        while let Some(file) = dir
            .next_entry()
            .await
            .map_err(|e| RagError::Store(format!("cannot read folder {}: {e}", folder.display())))?
        {
            let path = file.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("txt") {
                continue;
            }
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| RagError::Store(format!("cannot read {}: {e}", path.display())))?;
            match self.ingest_document(&raw).await {
                Ok(added) => {
                    report.courses_added += added.courses_added;
                    report.chunks_added += added.chunks_added;
                }
                Err(RagError::Parse(message)) => {
                    warn!(file = %path.display(), %message, "skipping unparseable document");
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            courses = report.courses_added,
            chunks = report.chunks_added,
            folder = %folder.display(),
            "folder ingestion complete"
        );
        Ok(report)
    }

    /// Answer one user query, running at most one tool round.
    ///
    /// When `session_id` is `None`, a new session is created; its token is
    /// returned on the outcome either way. The exchange is recorded only if
    /// the turn completes, so a failed turn leaves history untouched.
    pub async fn handle_turn(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> Result<TurnOutcome> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.sessions.create().await?,
        };

        let system = self.system_with_history(&session_id).await?;
        let mut messages = vec![ChatMessage::user(query)];

        let first = self
            .model
            .generate(ChatRequest {
                model: self.config.model.clone(),
                system: system.clone(),
                messages: messages.clone(),
                tools: self.registry.definitions(),
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            })
            .await?;

        let calls: Vec<(String, String, serde_json::Value)> = first
            .tool_calls()
            .into_iter()
            .map(|(id, name, input)| (id.to_string(), name.to_string(), input.clone()))
            .collect();

        let (answer, sources) = if calls.is_empty() {
            (first.text(), Vec::new())
        } else {
            let mut sources: Vec<Source> = Vec::new();
            let mut results = Vec::with_capacity(calls.len());
            for (id, name, input) in calls {
                let content = match self.registry.dispatch(&name, input).await {
                    Ok(output) => {
                        sources.extend(output.sources);
                        output.text
                    }
                    Err(err) => {
                        warn!(tool = %name, error = %err, "tool dispatch failed");
                        format!("Tool execution failed: {err}")
                    }
                };
                results.push(ContentBlock::ToolResult { tool_use_id: id, content });
            }

            messages.push(ChatMessage::assistant(first.content));
            messages.push(ChatMessage::tool_results(results));

            // No tools on the follow-up call: one round, structurally.
            let second = self
                .model
                .generate(ChatRequest {
                    model: self.config.model.clone(),
                    system,
                    messages,
                    tools: Vec::new(),
                    temperature: self.config.temperature,
                    max_tokens: self.config.max_tokens,
                })
                .await?;
            (second.text(), sources)
        };

        self.sessions
            .append(&session_id, Exchange { query: query.to_string(), answer: answer.clone() })
            .await?;

        Ok(TurnOutcome { answer, sources, session_id })
    }

    /// Corpus statistics: how many courses are indexed, and their titles.
    pub async fn stats(&self) -> Result<CourseStats> {
        let course_titles = self.store.existing_course_titles().await?;
        Ok(CourseStats { course_count: course_titles.len(), course_titles })
    }

    /// Drop all history for a session.
    pub async fn clear_session(&self, session_id: &str) -> Result<()> {
        self.sessions.clear(session_id).await
    }

    async fn system_with_history(&self, session_id: &str) -> Result<String> {
        let history = self.sessions.history(session_id).await?;
        if history.is_empty() {
            return Ok(SYSTEM_PROMPT.to_string());
        }
        let mut rendered = String::new();
        for exchange in &history {
            rendered.push_str(&format!(
                "User: {}\nAssistant: {}\n",
                exchange.query, exchange.answer
            ));
        }
        Ok(format!("{SYSTEM_PROMPT}\n\nPrevious conversation:\n{rendered}"))
    }
}

/// Builder wiring an engine's capabilities together.
#[derive(Default)]
pub struct RagEngineBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    model: Option<Arc<dyn ChatModel>>,
    sessions: Option<Arc<dyn SessionStore>>,
}

impl RagEngineBuilder {
    /// Set the engine configuration. Defaults to [`RagConfig::default`].
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider (required).
    pub fn embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector store backend (required).
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the language model (required).
    pub fn model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the session store. Defaults to an [`InMemorySessionStore`] capped
    /// at the configured `max_history`.
    pub fn session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Build the engine, registering the search and outline tools.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required capability is missing.
    pub fn build(self) -> Result<RagEngine> {
        let config = self.config.unwrap_or_default();
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::Config("embedding provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector store is required".to_string()))?;
        let model =
            self.model.ok_or_else(|| RagError::Config("chat model is required".to_string()))?;
        let sessions = self
            .sessions
            .unwrap_or_else(|| Arc::new(InMemorySessionStore::new(config.max_history)));

        let store = Arc::new(SemanticStore::new(
            vector_store,
            embedder,
            config.max_results,
            config.resolution_max_distance,
        ));

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CourseSearchTool::new(Arc::clone(&store))));
        registry.register(Arc::new(CourseOutlineTool::new(Arc::clone(&store))));

        let chunker = DocumentChunker::new(config.chunk_size, config.chunk_overlap);

        Ok(RagEngine { config, chunker, store, registry, sessions, model })
    }
}
