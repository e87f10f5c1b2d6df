//! Error types for the `course-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval and orchestration operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A document could not be parsed into a course structure.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A fuzzy course name had no acceptable match in the catalog.
    #[error("No course found matching '{name}'")]
    Resolution {
        /// The fuzzy name that failed to resolve.
        name: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Store error: {0}")]
    Store(String),

    /// The language-model capability call failed.
    #[error("Model error ({provider}): {message}")]
    Model {
        /// The model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the session store.
    #[error("Session error: {0}")]
    Session(String),

    /// A tool invocation named a tool that is not registered.
    #[error("Tool '{name}' not found")]
    UnknownTool {
        /// The requested tool name.
        name: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
