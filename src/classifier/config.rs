//! Configuration for the intent classifier.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{IntentError, Result};
use crate::retry::CallPolicy;

/// Which similarity model classifies queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Local TF-IDF vectors.
    #[default]
    Lexical,
    /// Embeddings from an external provider, behind the garbage filter.
    Embedding,
}

/// Reference text of the secondary Jaccard check in embedding mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryCheckTarget {
    /// The example whose embedding produced the best cosine.
    #[default]
    BestMatch,
    /// The first dataset example labeled with the winning intent.
    FirstExample,
}

/// Settings of an [`IntentClassifier`](crate::classifier::IntentClassifier).
///
/// Durations are written in milliseconds in JSON:
///
/// ```
/// use hybrid_intent::classifier::config::{ClassifierConfig, StrategyKind};
///
/// let config: ClassifierConfig = serde_json::from_str(
///     r#"{"strategy": "embedding", "threshold": 0.3, "provider_timeout": 5000}"#,
/// ).unwrap();
/// assert_eq!(config.strategy, StrategyKind::Embedding);
/// assert_eq!(config.batch_size, 50);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Similarity model.
    pub strategy: StrategyKind,
    /// Minimum similarity for a match; equality matches.
    pub threshold: f64,
    /// Texts per provider request during bulk generation.
    pub batch_size: usize,
    /// Directory holding the dataset and embeddings files; `None` keeps
    /// everything in memory.
    pub store_location: Option<PathBuf>,
    /// Minimum token overlap between the query and the matched example.
    pub jaccard_threshold: f64,
    /// Example the token overlap is measured against.
    pub secondary_check: SecondaryCheckTarget,
    /// Time budget of one provider or validator call; `None` waits forever.
    #[serde(with = "optional_millis")]
    pub provider_timeout: Option<Duration>,
    /// Retries of a transiently failing provider or validator call.
    pub max_retries: u32,
    /// Base delay between retries.
    #[serde(with = "millis")]
    pub retry_backoff: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            strategy: StrategyKind::Lexical,
            threshold: 0.50,
            batch_size: 50,
            store_location: None,
            jaccard_threshold: 0.20,
            secondary_check: SecondaryCheckTarget::BestMatch,
            provider_timeout: Some(Duration::from_secs(30)),
            max_retries: 0,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

impl ClassifierConfig {
    /// Default settings with the given strategy.
    pub fn with_strategy(strategy: StrategyKind) -> Self {
        ClassifierConfig {
            strategy,
            ..Default::default()
        }
    }

    /// Whether the embedding strategy is selected.
    pub fn use_embeddings(&self) -> bool {
        self.strategy == StrategyKind::Embedding
    }

    /// Read and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ClassifierConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(-1.0..=1.0).contains(&self.threshold) {
            return Err(IntentError::invalid_config(format!(
                "threshold must be within [-1, 1], got {}",
                self.threshold
            )));
        }
        if !self.jaccard_threshold.is_finite() || !(0.0..=1.0).contains(&self.jaccard_threshold) {
            return Err(IntentError::invalid_config(format!(
                "jaccard_threshold must be within [0, 1], got {}",
                self.jaccard_threshold
            )));
        }
        if self.batch_size == 0 {
            return Err(IntentError::invalid_config("batch_size must be positive"));
        }
        if self.provider_timeout == Some(Duration::ZERO) {
            return Err(IntentError::invalid_config(
                "provider_timeout must be positive",
            ));
        }
        Ok(())
    }

    /// Timeout and retry policy for provider and validator calls.
    pub fn call_policy(&self) -> CallPolicy {
        CallPolicy {
            timeout: self.provider_timeout,
            max_retries: self.max_retries,
            backoff: self.retry_backoff,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod optional_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => super::millis::serialize(duration, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
