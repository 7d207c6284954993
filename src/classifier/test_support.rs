//! Scripted collaborators for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashSet;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::classifier::strategy::EmbeddingBackends;
use crate::embedding::EmbeddingProvider;
use crate::error::{IntentError, Result};
use crate::similarity::token_set;
use crate::validation::QueryValidator;

/// Bag-of-words hashing embedder with call counters and injectable failures.
pub struct ScriptedProvider {
    dimension: AtomicUsize,
    failing: Mutex<AHashSet<String>>,
    batch_calls: AtomicUsize,
    texts_embedded: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(ScriptedProvider {
            dimension: AtomicUsize::new(8),
            failing: Mutex::new(AHashSet::new()),
            batch_calls: AtomicUsize::new(0),
            texts_embedded: AtomicUsize::new(0),
        })
    }

    /// Fail every request containing `text`.
    pub fn fail_on(&self, text: &str) {
        self.failing.lock().insert(text.to_string());
    }

    pub fn set_dimension(&self, dimension: usize) {
        self.dimension.store(dimension, Ordering::SeqCst);
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let dimension = self.dimension.load(Ordering::SeqCst);
        let mut vector = vec![0.0f32; dimension];
        for token in token_set(text) {
            let bucket = token.bytes().map(usize::from).sum::<usize>() % dimension;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        {
            let failing = self.failing.lock();
            if let Some(text) = texts.iter().find(|text| failing.contains(**text)) {
                return Err(IntentError::provider(format!("scripted failure on {text:?}")));
            }
        }
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|text| self.vector(text)).collect())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Validator with a fixed answer and a call counter.
pub struct ScriptedValidator {
    answer: Option<bool>,
    calls: AtomicUsize,
}

impl ScriptedValidator {
    pub fn accepting() -> Arc<Self> {
        Self::with_answer(Some(true))
    }

    pub fn rejecting() -> Arc<Self> {
        Self::with_answer(Some(false))
    }

    pub fn failing() -> Arc<Self> {
        Self::with_answer(None)
    }

    fn with_answer(answer: Option<bool>) -> Arc<Self> {
        Arc::new(ScriptedValidator {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryValidator for ScriptedValidator {
    async fn validate(&self, _query: &str) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .ok_or_else(|| IntentError::validator_unavailable("scripted outage"))
    }
}

pub fn backends(
    provider: &Arc<ScriptedProvider>,
    validator: &Arc<ScriptedValidator>,
) -> EmbeddingBackends {
    EmbeddingBackends::new(provider.clone(), validator.clone())
}
