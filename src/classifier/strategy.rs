//! The two classification strategies.
//!
//! A [`Strategy`] is chosen once when the classifier is opened. Both arms
//! return the best `(intent, similarity)` pair thresholded the same way;
//! only the embedding arm screens queries with the garbage filter and
//! double-checks matches by token overlap.

use std::sync::Arc;

use log::debug;
use rayon::prelude::*;

use crate::classifier::config::{ClassifierConfig, SecondaryCheckTarget, StrategyKind};
use crate::classifier::types::{ClassificationResult, Example};
use crate::embedding::EmbeddingProvider;
use crate::error::{IntentError, Result};
use crate::lexical::LexicalIndex;
use crate::retry::CallPolicy;
use crate::similarity::{best_score, cosine, text_jaccard};
use crate::validation::QueryValidator;
use crate::validation::garbage::GarbageFilter;
use crate::vector_store::VectorStore;

/// External collaborators of the embedding strategy.
#[derive(Clone)]
pub struct EmbeddingBackends {
    /// Computes query and example embeddings.
    pub provider: Arc<dyn EmbeddingProvider>,
    /// Screens queries before they are embedded.
    pub validator: Arc<dyn QueryValidator>,
}

impl EmbeddingBackends {
    /// Bundle a provider and a validator.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, validator: Arc<dyn QueryValidator>) -> Self {
        EmbeddingBackends {
            provider,
            validator,
        }
    }
}

impl std::fmt::Debug for EmbeddingBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingBackends")
            .field("provider", &self.provider.name())
            .field("validator", &self.validator.name())
            .finish()
    }
}

/// Read-only classifier state a strategy evaluates a query against.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Labeled examples, in dataset order.
    pub dataset: &'a [Example],
    /// TF-IDF index over `dataset`.
    pub lexical: &'a LexicalIndex,
    /// Minimum similarity for a match.
    pub threshold: f64,
}

impl EvalContext<'_> {
    /// `intent` if `similarity` reaches the threshold, `"unknown"` otherwise.
    fn decide(&self, intent: &str, similarity: f64) -> ClassificationResult {
        if similarity >= self.threshold {
            ClassificationResult::matched(intent, similarity)
        } else {
            debug!(
                "Best match {intent} ({similarity:.4}) is below threshold {}",
                self.threshold
            );
            ClassificationResult::unknown(similarity)
        }
    }
}

/// TF-IDF cosine against every example. Holds no state of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalStrategy;

impl LexicalStrategy {
    /// Classify `query` against the dataset of `ctx`.
    pub fn evaluate(&self, query: &str, ctx: &EvalContext<'_>) -> Result<ClassificationResult> {
        if ctx.dataset.is_empty() {
            return Ok(ClassificationResult::unknown(0.0));
        }

        let query_vector = ctx.lexical.vectorize(query)?;
        let scores = ctx
            .dataset
            .par_iter()
            .map(|example| {
                ctx.lexical
                    .vectorize(&example.text)
                    .map(|vector| cosine(&query_vector, &vector))
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(match best_score(scores) {
            Some((idx, similarity)) => ctx.decide(&ctx.dataset[idx].intent, similarity),
            None => ClassificationResult::unknown(0.0),
        })
    }
}

/// Embedding cosine against the vector store, behind the garbage filter.
pub struct EmbeddingStrategy {
    provider: Arc<dyn EmbeddingProvider>,
    filter: GarbageFilter,
    vectors: VectorStore,
    policy: CallPolicy,
    jaccard_threshold: f64,
    secondary_check: SecondaryCheckTarget,
}

impl std::fmt::Debug for EmbeddingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingStrategy")
            .field("provider", &self.provider.name())
            .field("filter", &self.filter)
            .field("vectors", &self.vectors)
            .field("jaccard_threshold", &self.jaccard_threshold)
            .field("secondary_check", &self.secondary_check)
            .finish()
    }
}

impl EmbeddingStrategy {
    /// Create the strategy over already loaded `vectors`.
    pub fn new(backends: EmbeddingBackends, vectors: VectorStore, config: &ClassifierConfig) -> Self {
        let policy = config.call_policy();
        EmbeddingStrategy {
            provider: backends.provider,
            filter: GarbageFilter::new(backends.validator, policy),
            vectors,
            policy,
            jaccard_threshold: config.jaccard_threshold,
            secondary_check: config.secondary_check,
        }
    }

    /// Classify `query`: garbage gate, nearest record, threshold, token overlap.
    pub async fn evaluate(
        &self,
        query: &str,
        ctx: &EvalContext<'_>,
    ) -> Result<ClassificationResult> {
        if self.filter.check(query).await.is_rejected() {
            return Ok(ClassificationResult::rejected());
        }

        let vector = self.embed(query).await?;
        if let Some(expected) = self.vectors.dimension() {
            if vector.len() != expected {
                return Err(IntentError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        let Some((idx, similarity)) = self.vectors.best_match(&vector) else {
            return Ok(ClassificationResult::unknown(0.0));
        };
        let Some(record) = self.vectors.get(idx) else {
            return Ok(ClassificationResult::unknown(0.0));
        };

        let result = ctx.decide(&record.intent, similarity);
        if result.is_unknown() {
            return Ok(result);
        }

        let reference = match self.secondary_check {
            SecondaryCheckTarget::BestMatch => record.text.as_str(),
            SecondaryCheckTarget::FirstExample => ctx
                .dataset
                .iter()
                .find(|example| example.intent == record.intent)
                .map_or(record.text.as_str(), |example| example.text.as_str()),
        };
        let overlap = text_jaccard(query, reference);
        if overlap < self.jaccard_threshold {
            debug!(
                "Token overlap {overlap:.4} with {reference:?} is below {}; {} overridden",
                self.jaccard_threshold, record.intent
            );
            return Ok(ClassificationResult::unknown(similarity));
        }

        Ok(result)
    }

    /// Embed one text under the call policy.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let provider = &self.provider;
        self.policy
            .run("embedding", move || provider.embed(text))
            .await
    }

    /// Embed a batch of texts under the call policy.
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let provider = &self.provider;
        self.policy
            .run("batch embedding", move || provider.embed_batch(texts))
            .await
    }

    /// The stored embedding records.
    pub fn vectors(&self) -> &VectorStore {
        &self.vectors
    }

    pub(crate) fn vectors_mut(&mut self) -> &mut VectorStore {
        &mut self.vectors
    }
}

/// Similarity model selected at construction.
#[derive(Debug)]
pub enum Strategy {
    /// TF-IDF over the dataset.
    Lexical(LexicalStrategy),
    /// Provider embeddings over the vector store.
    Embedding(EmbeddingStrategy),
}

impl Strategy {
    /// Dispatch to the selected arm.
    pub async fn evaluate(
        &self,
        query: &str,
        ctx: &EvalContext<'_>,
    ) -> Result<ClassificationResult> {
        match self {
            Strategy::Lexical(lexical) => lexical.evaluate(query, ctx),
            Strategy::Embedding(embedding) => embedding.evaluate(query, ctx).await,
        }
    }

    /// Which arm is selected.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Lexical(_) => StrategyKind::Lexical,
            Strategy::Embedding(_) => StrategyKind::Embedding,
        }
    }

    /// The embedding arm, if selected.
    pub fn as_embedding(&self) -> Option<&EmbeddingStrategy> {
        match self {
            Strategy::Embedding(embedding) => Some(embedding),
            Strategy::Lexical(_) => None,
        }
    }

    pub(crate) fn as_embedding_mut(&mut self) -> Option<&mut EmbeddingStrategy> {
        match self {
            Strategy::Embedding(embedding) => Some(embedding),
            Strategy::Lexical(_) => None,
        }
    }
}
