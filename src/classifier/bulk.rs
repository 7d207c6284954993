//! Batched embedding generation for the whole dataset.
//!
//! The dataset is split into chunks of `batch_size` texts, each embedded with
//! one provider request. A failed batch is logged and reported; the others
//! still run. The records of the successful batches replace the stored
//! embeddings, unless every batch failed, in which case the stored
//! embeddings are kept.

use std::ops::Range;

use log::{info, warn};

use crate::classifier::IntentClassifier;
use crate::classifier::types::EmbeddingRecord;
use crate::embedding::ensure_batch_len;
use crate::error::{IntentError, Result};

/// A batch whose embedding request failed.
#[derive(Debug)]
pub struct BatchError {
    /// Position of the batch, starting at 0.
    pub batch: usize,
    /// Dataset indices of the examples in the batch.
    pub examples: Range<usize>,
    /// Why the batch failed.
    pub error: IntentError,
}

/// Outcome of [`IntentClassifier::generate_embeddings`].
#[derive(Debug, Default)]
pub struct BulkEmbeddingReport {
    /// Number of records written to the embeddings store.
    pub records_embedded: usize,
    /// Number of batches attempted.
    pub batches: usize,
    /// The failed batches, in order.
    pub failures: Vec<BatchError>,
    /// Whether the embeddings store was overwritten.
    pub persisted: bool,
}

impl BulkEmbeddingReport {
    /// Whether every batch succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl IntentClassifier {
    /// Embed every example and replace the stored embeddings.
    ///
    /// Only available with the embedding strategy. An empty dataset clears
    /// the stored embeddings. Drops the result cache when records change.
    pub async fn generate_embeddings(&mut self) -> Result<BulkEmbeddingReport> {
        let batch_size = self.config.batch_size;
        let Some(embedding) = self.strategy.as_embedding_mut() else {
            return Err(IntentError::invalid_argument(
                "embedding generation requires the embedding strategy",
            ));
        };

        let mut report = BulkEmbeddingReport::default();
        let mut records = Vec::with_capacity(self.dataset.len());

        for (batch, chunk) in self.dataset.chunks(batch_size).enumerate() {
            report.batches += 1;
            let start = batch * batch_size;
            let texts: Vec<&str> = chunk.iter().map(|example| example.text.as_str()).collect();

            let outcome = embedding
                .embed_batch(&texts)
                .await
                .and_then(|vectors| ensure_batch_len(texts.len(), &vectors).map(|()| vectors));

            match outcome {
                Ok(vectors) => records.extend(
                    chunk
                        .iter()
                        .zip(vectors)
                        .map(|(example, vector)| EmbeddingRecord::new(example, vector)),
                ),
                Err(error) => {
                    warn!(
                        "Embedding batch {batch} (examples {start}..{}) failed: {error}",
                        start + chunk.len()
                    );
                    report.failures.push(BatchError {
                        batch,
                        examples: start..start + chunk.len(),
                        error,
                    });
                }
            }
        }

        if report.failures.len() < report.batches || report.batches == 0 {
            report.records_embedded = records.len();
            embedding.vectors_mut().replace_all(records)?;
            report.persisted = true;
            self.cache.clear();
        } else {
            warn!("Every embedding batch failed; keeping stored embeddings");
        }

        info!(
            "Embedded {} of {} examples in {} batches ({} failed)",
            report.records_embedded,
            self.dataset.len(),
            report.batches,
            report.failures.len()
        );
        Ok(report)
    }
}
