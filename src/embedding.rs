//! Embedding provider interface.
//!
//! The classifier never computes embeddings itself: it asks an
//! [`EmbeddingProvider`] for one fixed-length vector per text. Any remote or
//! local model can be plugged in by implementing the trait.
//!
//! # Custom Implementation
//!
//! ```
//! use async_trait::async_trait;
//! use hybrid_intent::embedding::EmbeddingProvider;
//! use hybrid_intent::error::Result;
//!
//! struct LengthEmbedder;
//!
//! #[async_trait]
//! impl EmbeddingProvider for LengthEmbedder {
//!     async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
//!         Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::{IntentError, Result};

#[cfg(feature = "openai")]
pub mod openai;

/// Source of embedding vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed every text of `texts`.
    ///
    /// Returns one vector per input, in input order. A failure affects the
    /// whole batch; there are no partial results.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text]).await?;
        if vectors.len() != 1 {
            return Err(IntentError::provider(format!(
                "expected 1 embedding, provider returned {}",
                vectors.len()
            )));
        }
        Ok(vectors.remove(0))
    }

    /// Get the name/identifier of this provider, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Check that a provider honoured the one-vector-per-text contract.
pub fn ensure_batch_len(expected: usize, vectors: &[Vec<f32>]) -> Result<()> {
    if vectors.len() == expected {
        Ok(())
    } else {
        Err(IntentError::provider(format!(
            "expected {expected} embeddings, provider returned {}",
            vectors.len()
        )))
    }
}
