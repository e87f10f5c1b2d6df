//! Configuration for the retrieval engine.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the retrieval engine.
///
/// All values are late-bound: they are fixed at engine construction, not
/// hard-compiled into the components that consume them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Maximum number of results returned from a content search.
    pub max_results: usize,
    /// Maximum number of (query, answer) exchanges retained per session.
    pub max_history: usize,
    /// Maximum cosine distance at which a fuzzy course name is accepted
    /// as a match for a catalog entry. Tune empirically per embedding model.
    pub resolution_max_distance: f32,
    /// Identifier of the language model used for answer generation.
    pub model: String,
    /// Sampling temperature for the language model. Zero keeps generation
    /// deterministic, which retrieval tests rely on.
    pub temperature: f32,
    /// Maximum tokens the model may generate per response.
    pub max_tokens: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
            max_results: 5,
            max_history: 2,
            resolution_max_distance: 0.75,
            model: "claude-sonnet-4-20250514".to_string(),
            temperature: 0.0,
            max_tokens: 800,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the maximum number of content search results.
    pub fn max_results(mut self, max: usize) -> Self {
        self.config.max_results = max;
        self
    }

    /// Set the maximum number of retained exchanges per session.
    pub fn max_history(mut self, max: usize) -> Self {
        self.config.max_history = max;
        self
    }

    /// Set the acceptance threshold for fuzzy course-name resolution.
    pub fn resolution_max_distance(mut self, distance: f32) -> Self {
        self.config.resolution_max_distance = distance;
        self
    }

    /// Set the language-model identifier.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the maximum tokens per model response.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `max_results == 0`
    /// - `resolution_max_distance` is not in `(0.0, 2.0]`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.max_results == 0 {
            return Err(RagError::Config("max_results must be greater than zero".to_string()));
        }
        if self.config.resolution_max_distance <= 0.0 || self.config.resolution_max_distance > 2.0 {
            return Err(RagError::Config(format!(
                "resolution_max_distance ({}) must be in (0.0, 2.0]",
                self.config.resolution_max_distance
            )));
        }
        Ok(self.config)
    }
}
