//! Hybrid intent classification engine.
//!
//! An [`IntentClassifier`] owns the labeled dataset, a TF-IDF index over it,
//! a per-instance result cache and the [`Strategy`] selected at construction.
//! Queries are answered from the cache when possible; otherwise the strategy
//! computes the best `(intent, similarity)` pair and the result is cached
//! under the raw query string.
//!
//! # Examples
//!
//! ```
//! use hybrid_intent::classifier::IntentClassifier;
//! use hybrid_intent::classifier::config::ClassifierConfig;
//! use hybrid_intent::classifier::types::Example;
//!
//! # #[tokio::main]
//! # async fn main() -> hybrid_intent::error::Result<()> {
//! let config = ClassifierConfig {
//!     threshold: 0.3,
//!     ..Default::default()
//! };
//! let examples = vec![
//!     Example::new("How do I book a flight?", "book_flight"),
//!     Example::new("What's the weather like?", "weather_query"),
//! ];
//! let mut classifier = IntentClassifier::from_examples(config, examples, None).await?;
//!
//! let result = classifier.classify("How do I book a flight?").await?;
//! assert_eq!(result.intent, "book_flight");
//! assert_eq!(result.confidence.to_string(), "100.00%");
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use log::{debug, info, warn};

use crate::analysis::analyzer::WordAnalyzer;
use crate::error::{IntentError, Result};
use crate::lexical::LexicalIndex;
use crate::storage::file::FileStorageConfig;
use crate::storage::memory::MemoryStorageConfig;
use crate::storage::{StorageConfig, StorageFactory};
use crate::store::{DatasetStore, EmbeddingStore, JsonStore};
use crate::vector_store::VectorStore;

pub mod bulk;
pub mod config;
pub mod mutation;
pub mod strategy;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

use self::config::{ClassifierConfig, StrategyKind};
use self::strategy::{EmbeddingBackends, EmbeddingStrategy, EvalContext, LexicalStrategy, Strategy};
use self::types::{ClassificationResult, Example};

/// Persistence of a classifier's dataset and embeddings.
#[derive(Clone)]
pub struct ClassifierStores {
    /// Where the dataset is loaded from and persisted to.
    pub dataset: Arc<dyn DatasetStore>,
    /// Where embedding records are loaded from and persisted to.
    pub embeddings: Arc<dyn EmbeddingStore>,
}

impl std::fmt::Debug for ClassifierStores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierStores").finish_non_exhaustive()
    }
}

impl ClassifierStores {
    /// Bundle two stores.
    pub fn new(dataset: Arc<dyn DatasetStore>, embeddings: Arc<dyn EmbeddingStore>) -> Self {
        ClassifierStores {
            dataset,
            embeddings,
        }
    }

    /// JSON files inside a storage backend built from `config`.
    pub fn from_storage_config(config: StorageConfig) -> Result<Self> {
        let (dataset, embeddings) = JsonStore::pair(StorageFactory::create(config)?);
        Ok(Self::new(Arc::new(dataset), Arc::new(embeddings)))
    }

    /// JSON files under the directory `path`.
    pub fn in_directory<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_storage_config(StorageConfig::File(FileStorageConfig::new(path)))
    }

    /// Stores that live only as long as the process.
    pub fn in_memory() -> Self {
        let (dataset, embeddings) = JsonStore::pair_in_memory();
        Self::new(Arc::new(dataset), Arc::new(embeddings))
    }

    /// Stores at `config.store_location`, or in memory when unset.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let storage = match &config.store_location {
            Some(path) => StorageConfig::File(FileStorageConfig::new(path)),
            None => StorageConfig::Memory(MemoryStorageConfig::default()),
        };
        Self::from_storage_config(storage)
    }
}

/// Classifier over a mutable dataset of labeled examples.
pub struct IntentClassifier {
    config: ClassifierConfig,
    dataset: Vec<Example>,
    lexical: LexicalIndex,
    cache: AHashMap<String, ClassificationResult>,
    strategy: Strategy,
    dataset_store: Arc<dyn DatasetStore>,
}

impl std::fmt::Debug for IntentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentClassifier")
            .field("strategy", &self.strategy)
            .field("examples", &self.dataset.len())
            .field("lexical", &self.lexical)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl IntentClassifier {
    /// Open a classifier over the data held in `stores`.
    ///
    /// The dataset is loaded and indexed. With the embedding strategy the
    /// stored embeddings are loaded too, and regenerated through the provider
    /// when none exist or their count differs from the dataset. `backends`
    /// is required for the embedding strategy and ignored otherwise.
    pub async fn open(
        config: ClassifierConfig,
        stores: ClassifierStores,
        backends: Option<EmbeddingBackends>,
    ) -> Result<Self> {
        config.validate()?;

        let dataset = dedup_examples(stores.dataset.load()?);
        let lexical = LexicalIndex::from_documents(
            Arc::new(WordAnalyzer::new()),
            dataset.iter().map(|example| &example.text),
        )?;

        let strategy = match config.strategy {
            StrategyKind::Lexical => Strategy::Lexical(LexicalStrategy),
            StrategyKind::Embedding => {
                let backends = backends.ok_or_else(|| {
                    IntentError::invalid_config(
                        "the embedding strategy requires an embedding provider and a query validator",
                    )
                })?;
                let mut vectors = VectorStore::new(stores.embeddings.clone());
                vectors.load()?;
                Strategy::Embedding(EmbeddingStrategy::new(backends, vectors, &config))
            }
        };

        let mut classifier = IntentClassifier {
            config,
            dataset,
            lexical,
            cache: AHashMap::new(),
            strategy,
            dataset_store: stores.dataset,
        };

        let stored = classifier
            .strategy
            .as_embedding()
            .map(|embedding| embedding.vectors().len());
        if let Some(stored) = stored {
            if stored != classifier.dataset.len() {
                info!(
                    "Found {stored} stored embeddings for {} examples; regenerating",
                    classifier.dataset.len()
                );
                let report = classifier.generate_embeddings().await?;
                if !report.is_complete() {
                    warn!(
                        "Embedding generation left {} of {} batches failed",
                        report.failures.len(),
                        report.batches
                    );
                }
            }
        }

        info!(
            "Opened {:?} classifier with {} examples",
            classifier.strategy_kind(),
            classifier.dataset.len()
        );
        Ok(classifier)
    }

    /// Open a classifier over `examples`, kept in memory only.
    pub async fn from_examples(
        config: ClassifierConfig,
        examples: Vec<Example>,
        backends: Option<EmbeddingBackends>,
    ) -> Result<Self> {
        let stores = ClassifierStores::in_memory();
        stores.dataset.save(&examples)?;
        Self::open(config, stores, backends).await
    }

    /// Classify `query`.
    ///
    /// A query seen before is answered from the cache without calling any
    /// external service. Errors are not cached.
    pub async fn classify(&mut self, query: &str) -> Result<ClassificationResult> {
        if let Some(cached) = self.cache.get(query) {
            debug!("Cache hit for {query:?}");
            return Ok(cached.clone());
        }

        let ctx = EvalContext {
            dataset: &self.dataset,
            lexical: &self.lexical,
            threshold: self.config.threshold,
        };
        let result = self.strategy.evaluate(query, &ctx).await?;

        debug!(
            "Classified {query:?} as {} ({})",
            result.intent, result.confidence
        );
        self.cache.insert(query.to_string(), result.clone());
        Ok(result)
    }

    /// Drop every cached result.
    pub fn invalidate_cache(&mut self) {
        self.cache.clear();
    }

    /// Write the in-memory dataset through the dataset store.
    pub fn persist_dataset(&self) -> Result<()> {
        self.dataset_store.save(&self.dataset)?;
        info!("Persisted {} examples", self.dataset.len());
        Ok(())
    }

    /// The labeled examples, in dataset order.
    pub fn dataset(&self) -> &[Example] {
        &self.dataset
    }

    /// Distinct intent labels, in order of first appearance.
    pub fn intents(&self) -> Vec<&str> {
        let mut seen = AHashSet::new();
        self.dataset
            .iter()
            .map(|example| example.intent.as_str())
            .filter(|intent| seen.insert(*intent))
            .collect()
    }

    /// Number of cached results.
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// The selected strategy.
    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Number of embedding records; always `0` with the lexical strategy.
    pub fn vector_count(&self) -> usize {
        self.strategy
            .as_embedding()
            .map_or(0, |embedding| embedding.vectors().len())
    }

    /// The TF-IDF index over the dataset.
    pub fn lexical_index(&self) -> &LexicalIndex {
        &self.lexical
    }

    /// The active configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

/// Keep the first example of every text.
fn dedup_examples(examples: Vec<Example>) -> Vec<Example> {
    let mut seen = AHashSet::new();
    let mut unique = Vec::with_capacity(examples.len());
    for example in examples {
        if seen.contains(&example.text) {
            warn!("Skipping duplicate example text {:?}", example.text);
            continue;
        }
        seen.insert(example.text.clone());
        unique.push(example);
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::config::SecondaryCheckTarget;
    use crate::classifier::test_support::{ScriptedProvider, ScriptedValidator, backends};
    use crate::classifier::types::UNKNOWN_INTENT;

    fn travel() -> Vec<Example> {
        vec![
            Example::new("How do I book a flight?", "book_flight"),
            Example::new("I need to reserve a ticket", "book_flight"),
            Example::new("What's the weather like?", "weather_query"),
        ]
    }

    fn lexical_config() -> ClassifierConfig {
        ClassifierConfig {
            threshold: 0.3,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_lexical_classification() {
        let mut classifier = IntentClassifier::from_examples(lexical_config(), travel(), None)
            .await
            .unwrap();

        let result = classifier.classify("How do I book a flight?").await.unwrap();
        assert_eq!(result.intent, "book_flight");
        assert_eq!(result.confidence.to_string(), "100.00%");

        let result = classifier.classify("xxxxxxxx?").await.unwrap();
        assert_eq!(result.intent, UNKNOWN_INTENT);
        assert_eq!(classifier.cache_len(), 2);
    }

    #[tokio::test]
    async fn test_open_dedups_dataset() {
        let mut examples = travel();
        examples.push(Example::new("How do I book a flight?", "weather_query"));
        let classifier = IntentClassifier::from_examples(lexical_config(), examples, None)
            .await
            .unwrap();

        assert_eq!(classifier.dataset().len(), 3);
        assert_eq!(classifier.lexical_index().document_count(), 3);
        assert_eq!(classifier.intents(), vec!["book_flight", "weather_query"]);
        assert_eq!(classifier.strategy_kind(), StrategyKind::Lexical);
        assert_eq!(classifier.vector_count(), 0);
    }

    #[tokio::test]
    async fn test_embedding_requires_backends() {
        let config = ClassifierConfig::with_strategy(StrategyKind::Embedding);
        let result = IntentClassifier::from_examples(config, travel(), None).await;
        assert!(matches!(result, Err(IntentError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_open_generates_missing_embeddings() {
        let provider = ScriptedProvider::new();
        let validator = ScriptedValidator::accepting();
        let config = ClassifierConfig::with_strategy(StrategyKind::Embedding);

        let stores = ClassifierStores::in_memory();
        stores.dataset.save(&travel()).unwrap();
        let classifier = IntentClassifier::open(
            config.clone(),
            stores.clone(),
            Some(backends(&provider, &validator)),
        )
        .await
        .unwrap();
        assert_eq!(classifier.vector_count(), 3);
        assert_eq!(stores.embeddings.load().unwrap().len(), 3);
        assert_eq!(provider.batch_calls(), 1);

        // Reopening finds matching embeddings and does not call the provider.
        let reopened =
            IntentClassifier::open(config, stores, Some(backends(&provider, &validator)))
                .await
                .unwrap();
        assert_eq!(reopened.vector_count(), 3);
        assert_eq!(provider.batch_calls(), 1);
    }

    async fn embedding_classifier(
        config: ClassifierConfig,
        provider: &Arc<ScriptedProvider>,
        validator: &Arc<ScriptedValidator>,
    ) -> IntentClassifier {
        IntentClassifier::from_examples(config, travel(), Some(backends(provider, validator)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_embedding_classification_and_cache() {
        let provider = ScriptedProvider::new();
        let validator = ScriptedValidator::accepting();
        let config = ClassifierConfig::with_strategy(StrategyKind::Embedding);
        let mut classifier = embedding_classifier(config, &provider, &validator).await;
        assert_eq!(provider.texts_embedded(), 3);

        for _ in 0..3 {
            let result = classifier.classify("What's the weather like?").await.unwrap();
            assert_eq!(result.intent, "weather_query");
            assert_eq!(result.confidence.to_string(), "100.00%");
        }
        assert_eq!(validator.calls(), 1);
        assert_eq!(provider.texts_embedded(), 4);
        assert_eq!(classifier.cache_len(), 1);

        classifier.invalidate_cache();
        classifier.classify("What's the weather like?").await.unwrap();
        assert_eq!(validator.calls(), 2);
    }

    #[tokio::test]
    async fn test_vowelless_query_makes_no_calls() {
        let provider = ScriptedProvider::new();
        let validator = ScriptedValidator::accepting();
        let config = ClassifierConfig::with_strategy(StrategyKind::Embedding);
        let mut classifier = embedding_classifier(config, &provider, &validator).await;

        let result = classifier.classify("xyz prst").await.unwrap();
        assert_eq!(result.intent, UNKNOWN_INTENT);
        assert_eq!(result.confidence.to_string(), "N/A");
        assert_eq!(validator.calls(), 0);
        assert_eq!(provider.texts_embedded(), 3);
    }

    #[tokio::test]
    async fn test_garbage_filter_fails_closed() {
        for validator in [ScriptedValidator::rejecting(), ScriptedValidator::failing()] {
            let provider = ScriptedProvider::new();
            let config = ClassifierConfig::with_strategy(StrategyKind::Embedding);
            let mut classifier = embedding_classifier(config, &provider, &validator).await;

            let result = classifier.classify("How do I book a flight?").await.unwrap();
            assert_eq!(result, ClassificationResult::rejected());
            assert_eq!(validator.calls(), 1);
            assert_eq!(provider.texts_embedded(), 3);
        }
    }

    #[tokio::test]
    async fn test_provider_error_propagates_and_is_not_cached() {
        let provider = ScriptedProvider::new();
        let validator = ScriptedValidator::accepting();
        let config = ClassifierConfig::with_strategy(StrategyKind::Embedding);
        let mut classifier = embedding_classifier(config, &provider, &validator).await;

        provider.fail_on("book a hotel");
        let result = classifier.classify("book a hotel").await;
        assert!(matches!(result, Err(IntentError::Provider(_))));
        assert_eq!(classifier.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_token_overlap_overrides_match() {
        let provider = ScriptedProvider::new();
        let validator = ScriptedValidator::accepting();
        let query = "How do I book a flight please?";

        let config = ClassifierConfig::with_strategy(StrategyKind::Embedding);
        let mut classifier = embedding_classifier(config, &provider, &validator).await;
        assert_eq!(classifier.classify(query).await.unwrap().intent, "book_flight");

        let config = ClassifierConfig {
            jaccard_threshold: 0.9,
            ..ClassifierConfig::with_strategy(StrategyKind::Embedding)
        };
        let mut classifier = embedding_classifier(config, &provider, &validator).await;
        let result = classifier.classify(query).await.unwrap();
        assert!(result.is_unknown());
        assert!(result.confidence.score().unwrap() > 0.9);
    }

    #[tokio::test]
    async fn test_first_example_reference() {
        let provider = ScriptedProvider::new();
        let validator = ScriptedValidator::accepting();
        let query = "I need to reserve a ticket";

        let config = ClassifierConfig {
            jaccard_threshold: 0.25,
            ..ClassifierConfig::with_strategy(StrategyKind::Embedding)
        };
        let mut classifier = embedding_classifier(config.clone(), &provider, &validator).await;
        assert_eq!(classifier.classify(query).await.unwrap().intent, "book_flight");

        let config = ClassifierConfig {
            secondary_check: SecondaryCheckTarget::FirstExample,
            ..config
        };
        let mut classifier = embedding_classifier(config, &provider, &validator).await;
        assert!(classifier.classify(query).await.unwrap().is_unknown());
    }

    #[tokio::test]
    async fn test_persist_dataset() {
        let stores = ClassifierStores::in_memory();
        let classifier = IntentClassifier::open(lexical_config(), stores.clone(), None)
            .await
            .unwrap();
        assert!(classifier.dataset().is_empty());
        classifier.persist_dataset().unwrap();
        assert!(stores.dataset.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = ClassifierConfig {
            batch_size: 0,
            ..Default::default()
        };
        let result = IntentClassifier::from_examples(config, travel(), None).await;
        assert!(matches!(result, Err(IntentError::InvalidConfig(_))));
    }
}
