//! Online dataset mutation.
//!
//! Adding or removing examples keeps the dataset, the TF-IDF index and (with
//! the embedding strategy) the vector store consistent. A mutation that
//! fails leaves all three as they were. Every successful change drops the
//! result cache.

use log::{info, warn};

use crate::classifier::IntentClassifier;
use crate::classifier::types::{EmbeddingRecord, Example};
use crate::error::{IntentError, Result};

impl IntentClassifier {
    /// Add one labeled example.
    ///
    /// Returns `false` without changing anything when `text` is already in
    /// the dataset. With the embedding strategy the example is embedded and
    /// its record persisted; if that fails the example is not added.
    pub async fn add_intent(&mut self, text: &str, intent: &str) -> Result<bool> {
        if text.trim().is_empty() {
            return Err(IntentError::invalid_argument("example text must not be empty"));
        }
        if intent.trim().is_empty() {
            return Err(IntentError::invalid_argument("intent must not be empty"));
        }
        if self.dataset.iter().any(|example| example.text == text) {
            warn!("Example {text:?} already exists; not adding it to {intent}");
            return Ok(false);
        }

        let example = Example::new(text, intent);
        let vector = match self.strategy.as_embedding() {
            Some(embedding) => Some(embedding.embed(text).await?),
            None => None,
        };

        self.lexical.add_document(text)?;
        self.dataset.push(example);

        if let (Some(vector), Some(embedding)) = (vector, self.strategy.as_embedding_mut()) {
            let Some(example) = self.dataset.last() else {
                return Err(IntentError::other("dataset is unexpectedly empty"));
            };
            let record = EmbeddingRecord::new(example, vector);
            if let Err(e) = embedding.vectors_mut().append(record) {
                self.dataset.pop();
                self.lexical
                    .rebuild(self.dataset.iter().map(|example| &example.text))?;
                return Err(e);
            }
        }

        self.cache.clear();
        info!("Added example {text:?} to intent {intent}");
        Ok(true)
    }

    /// Remove every example labeled `intent` and return how many there were.
    ///
    /// The TF-IDF index is rebuilt from the remaining examples and, with the
    /// embedding strategy, the intent's records are dropped and the rest
    /// persisted. Removing an unknown intent is a no-op returning `0`.
    pub async fn remove_intent(&mut self, intent: &str) -> Result<usize> {
        let removed = self
            .dataset
            .iter()
            .filter(|example| example.intent == intent)
            .count();
        if removed == 0 {
            return Ok(0);
        }

        if let Some(embedding) = self.strategy.as_embedding_mut() {
            embedding.vectors_mut().remove_by_intent(intent)?;
        }

        self.dataset.retain(|example| example.intent != intent);
        self.lexical
            .rebuild(self.dataset.iter().map(|example| &example.text))?;

        self.cache.clear();
        info!("Removed {removed} examples of intent {intent}");
        Ok(removed)
    }

    /// Drop every example, embedding record and cached result.
    ///
    /// Stored embeddings are overwritten; the stored dataset is only touched
    /// by [`persist_dataset`](Self::persist_dataset).
    pub fn clear(&mut self) -> Result<()> {
        if let Some(embedding) = self.strategy.as_embedding_mut() {
            embedding.vectors_mut().replace_all(Vec::new())?;
        }
        self.dataset.clear();
        self.lexical.rebuild(std::iter::empty::<&str>())?;
        self.cache.clear();
        Ok(())
    }
}
