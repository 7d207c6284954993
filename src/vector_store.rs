//! In-memory embedding records mirrored to an [`EmbeddingStore`].
//!
//! Every mutation rewrites the full record list through the backing store, so
//! the persisted state always equals the in-memory state after a successful
//! call. A failed save leaves the in-memory records unchanged.

use std::sync::Arc;

use log::debug;

use crate::classifier::types::EmbeddingRecord;
use crate::error::{IntentError, Result};
use crate::similarity::{best_score, cosine};
use crate::store::EmbeddingStore;

/// Embedding records with uniform dimensionality.
pub struct VectorStore {
    records: Vec<EmbeddingRecord>,
    store: Arc<dyn EmbeddingStore>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("records", &self.records.len())
            .field("dimension", &self.dimension())
            .finish()
    }
}

impl VectorStore {
    /// Create an empty store backed by `store`. Nothing is read until [`load`](Self::load).
    pub fn new(store: Arc<dyn EmbeddingStore>) -> Self {
        VectorStore {
            records: Vec::new(),
            store,
        }
    }

    /// Replace the in-memory records with the persisted ones.
    ///
    /// Missing data yields an empty store; mixed dimensions are rejected.
    pub fn load(&mut self) -> Result<&[EmbeddingRecord]> {
        let records = self.store.load()?;
        check_uniform(&records)?;
        debug!("Vector store loaded {} records", records.len());
        self.records = records;
        Ok(&self.records)
    }

    /// Add one record and persist the full set.
    pub fn append(&mut self, record: EmbeddingRecord) -> Result<()> {
        if let Some(expected) = self.dimension() {
            if record.dimension() != expected {
                return Err(IntentError::DimensionMismatch {
                    expected,
                    actual: record.dimension(),
                });
            }
        }

        self.records.push(record);
        if let Err(e) = self.store.save(&self.records) {
            self.records.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Drop every record labeled `intent`, persist and return the remainder.
    pub fn remove_by_intent(&mut self, intent: &str) -> Result<&[EmbeddingRecord]> {
        let remaining: Vec<EmbeddingRecord> = self
            .records
            .iter()
            .filter(|record| record.intent != intent)
            .cloned()
            .collect();

        self.store.save(&remaining)?;
        self.records = remaining;
        Ok(&self.records)
    }

    /// Overwrite all records, e.g. after bulk generation.
    pub fn replace_all(&mut self, records: Vec<EmbeddingRecord>) -> Result<()> {
        check_uniform(&records)?;
        self.store.save(&records)?;
        self.records = records;
        Ok(())
    }

    /// Index and cosine similarity of the record closest to `query`.
    ///
    /// Ties go to the earliest record.
    pub fn best_match(&self, query: &[f32]) -> Option<(usize, f64)> {
        best_score(
            self.records
                .iter()
                .map(|record| cosine(query, &record.vector)),
        )
    }

    /// All records, in insertion order.
    pub fn records(&self) -> &[EmbeddingRecord] {
        &self.records
    }

    /// Record at `idx`.
    pub fn get(&self, idx: usize) -> Option<&EmbeddingRecord> {
        self.records.get(idx)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Dimensionality shared by all records, `None` when empty.
    pub fn dimension(&self) -> Option<usize> {
        self.records.first().map(EmbeddingRecord::dimension)
    }
}

fn check_uniform(records: &[EmbeddingRecord]) -> Result<()> {
    let Some(expected) = records.first().map(EmbeddingRecord::dimension) else {
        return Ok(());
    };
    match records.iter().find(|record| record.dimension() != expected) {
        Some(record) => Err(IntentError::DimensionMismatch {
            expected,
            actual: record.dimension(),
        }),
        None => Ok(()),
    }
}
