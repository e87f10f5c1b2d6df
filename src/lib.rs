//! Retrieval-augmented answering over course transcripts.
//!
//! This crate ingests structured course transcripts, indexes them in a
//! dual-collection semantic store, and answers user questions through a
//! tool-calling language model that decides per query whether to search.
//!
//! # Architecture
//!
//! - [`chunking`] — parses transcript documents and produces bounded,
//!   overlap-aware chunks on sentence boundaries.
//! - [`store`] — the dual-collection semantic layer: a course catalog for
//!   fuzzy name resolution and a content collection for passage retrieval.
//! - [`vectorstore`] / [`inmemory`] — the storage seam and its in-memory
//!   implementation.
//! - [`embedding`] — the embedding seam; the `openai` feature adds a
//!   provider backed by the OpenAI embeddings API.
//! - [`tool`] / [`registry`] — model-invocable tools and their dispatch.
//! - [`model`] — the language-model seam; the `anthropic` feature adds a
//!   client for the Anthropic Messages API.
//! - [`session`] — bounded per-session conversation history.
//! - [`engine`] — ties it all together: ingestion and the one-tool-round
//!   query loop.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use course_rag::{InMemoryVectorStore, RagEngine};
//!
//! let engine = RagEngine::builder()
//!     .embedding_provider(embedder)
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .model(model)
//!     .build()?;
//!
//! engine.ingest_folder("./docs").await?;
//! let outcome = engine.handle_turn("What does lesson 2 cover?", None).await?;
//! println!("{}", outcome.answer);
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod inmemory;
pub mod model;
pub mod registry;
pub mod session;
pub mod store;
pub mod tool;
pub mod vectorstore;

#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(test)]
pub(crate) mod testutil;

pub use chunking::DocumentChunker;
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    Course, CourseChunk, CourseStats, Exchange, Lesson, ScoredChunk, Source, TurnOutcome,
};
pub use embedding::EmbeddingProvider;
pub use engine::{IngestReport, RagEngine, RagEngineBuilder};
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use model::{
    ChatMessage, ChatModel, ChatRequest, ChatResponse, ContentBlock, Role, StopReason,
    ToolDefinition,
};
pub use registry::ToolRegistry;
pub use session::{InMemorySessionStore, SessionStore};
pub use store::SemanticStore;
pub use tool::{CourseOutlineTool, CourseSearchTool, Tool, ToolOutput};
pub use vectorstore::{Entry, MetadataFilter, Scored, VectorStore};

#[cfg(feature = "anthropic")]
pub use anthropic::AnthropicChatModel;
#[cfg(feature = "openai")]
pub use openai::OpenAIEmbeddingProvider;
