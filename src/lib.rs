//! # Hybrid Intent
//!
//! Classify free-text queries into a small set of intents by comparing them
//! against labeled example utterances.
//!
//! ## Features
//!
//! - Two interchangeable similarity models: local TF-IDF vectors, or
//!   semantic embeddings from an external provider
//! - Threshold-based rejection into an `"unknown"` intent
//! - Garbage-query screening (vowel heuristic plus a remote validator) in
//!   front of the embedding model
//! - Online add/remove of examples with consistent indexes
//! - Batched embedding generation tolerant to failed batches
//! - Pluggable persistence (files with atomic replace, or memory)
//!
//! ## Modules
//!
//! - [`classifier`]: the engine, its configuration and strategies
//! - [`lexical`]: the TF-IDF index
//! - [`embedding`] / [`validation`]: external collaborator traits
//! - [`store`] / [`storage`] / [`vector_store`]: persistence
//! - [`similarity`]: cosine and Jaccard

pub mod analysis;
pub mod classifier;
pub mod embedding;
pub mod error;
pub mod lexical;
#[cfg(feature = "openai")]
pub mod openai;
pub mod retry;
pub mod similarity;
pub mod storage;
pub mod store;
pub mod validation;
pub mod vector_store;

pub mod prelude {
    pub use crate::classifier::config::{ClassifierConfig, SecondaryCheckTarget, StrategyKind};
    pub use crate::classifier::strategy::EmbeddingBackends;
    pub use crate::classifier::types::{ClassificationResult, Confidence, Example, UNKNOWN_INTENT};
    pub use crate::classifier::{ClassifierStores, IntentClassifier};
    pub use crate::embedding::EmbeddingProvider;
    pub use crate::error::{IntentError, Result};
    pub use crate::validation::QueryValidator;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
