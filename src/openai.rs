//! OpenAI embedding provider.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";
const DEFAULT_MODEL: &str = "text-embedding-3-small";
const DEFAULT_DIMENSIONS: usize = 1536;

fn embed_error(message: impl Into<String>) -> RagError {
    RagError::Embedding { provider: "OpenAI".into(), message: message.into() }
}

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings endpoint.
///
/// Batches are sent as a single request; the response items are reassembled
/// by their `index` field, so the returned vectors always line up with the
/// input order. The endpoint is overridable for OpenAI-compatible servers.
pub struct OpenAIEmbeddingProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
    truncate_to: Option<usize>,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider for the default model (`text-embedding-3-small`).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(embed_error("API key must not be empty"));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.into(),
            api_key,
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            truncate_to: None,
        })
    }

    /// Create a provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| embed_error("OPENAI_API_KEY environment variable not set"))?;
        Self::new(api_key)
    }

    /// Use a different embeddings model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Ask the API to truncate embeddings to `dims` (Matryoshka models).
    /// [`dimensions()`](EmbeddingProvider::dimensions) reports the new size.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.truncate_to = Some(dims);
        self
    }

    /// Point the client at an OpenAI-compatible embeddings endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn request(&self, input: Vec<String>) -> Result<EmbeddingsResponse> {
        let body = EmbeddingsBody {
            model: self.model.clone(),
            input,
            dimensions: self.truncate_to,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "embeddings request failed");
                embed_error(format!("request failed: {e}"))
            })?;

        let status = response.status();
        let raw = response
            .bytes()
            .await
            .map_err(|e| embed_error(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<serde_json::Value>(&raw)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(String::from))
                .unwrap_or_else(|| String::from_utf8_lossy(&raw).into_owned());
            error!(provider = "OpenAI", %status, "embeddings API error");
            return Err(embed_error(format!("API returned {status}: {detail}")));
        }

        serde_json::from_slice(&raw)
            .map_err(|e| embed_error(format!("failed to parse response: {e}")))
    }
}

#[derive(Serialize)]
struct EmbeddingsBody {
    model: String,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Reorder response items into input order, requiring one vector per input.
fn into_ordered(mut items: Vec<EmbeddingItem>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if items.len() != expected {
        return Err(embed_error(format!(
            "API returned {} embeddings for {expected} inputs",
            items.len()
        )));
    }
    items.sort_by_key(|item| item.index);
    Ok(items.into_iter().map(|item| item.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        // into_ordered guarantees exactly one vector for one input.
        Ok(vectors.remove(0))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = "OpenAI", batch = texts.len(), model = %self.model, "embedding batch");

        let input = texts.iter().map(|t| t.to_string()).collect();
        let response = self.request(input).await?;
        into_ordered(response.data, texts.len())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
