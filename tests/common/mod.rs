//! Shared support for integration tests.

use async_trait::async_trait;
use course_rag::{EmbeddingProvider, Result};

const DIM: usize = 256;

/// Deterministic bag-of-words embedder: tokens are hashed into a fixed number
/// of buckets and the count vector is L2-normalized. Texts sharing tokens get
/// nearby embeddings, which is enough to drive retrieval in tests.
pub struct HashEmbedder;

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; DIM];
        for token in text.to_ascii_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let mut h: u64 = 1469598103934665603;
            for b in token.bytes() {
                h ^= b as u64;
                h = h.wrapping_mul(1099511628211);
            }
            v[(h % DIM as u64) as usize] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut v {
                *x /= norm;
            }
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}
