//! Common types for intent classification.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Intent label returned when no example is similar enough.
pub const UNKNOWN_INTENT: &str = "unknown";

/// Rendered confidence of a query refused before any similarity was computed.
pub const REJECTED_CONFIDENCE: &str = "N/A";

/// A labeled example utterance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Example {
    /// Example text.
    pub text: String,
    /// Intent label.
    pub intent: String,
}

impl Example {
    /// Create a new example.
    pub fn new<T: Into<String>, I: Into<String>>(text: T, intent: I) -> Self {
        Example {
            text: text.into(),
            intent: intent.into(),
        }
    }
}

/// Embedding vector of one example, keyed by its text and intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Example text the vector was computed from.
    pub text: String,
    /// Intent label of the example.
    pub intent: String,
    /// Embedding vector.
    pub vector: Vec<f32>,
}

impl EmbeddingRecord {
    /// Create a record for `example`.
    pub fn new(example: &Example, vector: Vec<f32>) -> Self {
        EmbeddingRecord {
            text: example.text.clone(),
            intent: example.intent.clone(),
            vector,
        }
    }

    /// Dimensionality of the vector.
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Confidence attached to a classification.
///
/// Rendered as a percentage with two decimals (`"87.50%"`), or as `"N/A"`
/// when the query was rejected for a reason other than similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confidence {
    /// Raw similarity score of the best match.
    Score(f64),
    /// The query was refused before similarity was computed.
    Rejected,
}

impl Confidence {
    /// The raw similarity, if any.
    pub fn score(&self) -> Option<f64> {
        match self {
            Confidence::Score(score) => Some(*score),
            Confidence::Rejected => None,
        }
    }

    /// `round(score * 100, 2)`, if any.
    pub fn percent(&self) -> Option<f64> {
        self.score().map(|score| (score * 10_000.0).round() / 100.0)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(percent) => write!(f, "{percent:.2}%"),
            None => f.write_str(REJECTED_CONFIDENCE),
        }
    }
}

impl Serialize for Confidence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == REJECTED_CONFIDENCE {
            return Ok(Confidence::Rejected);
        }
        raw.strip_suffix('%')
            .and_then(|number| number.trim().parse::<f64>().ok())
            .map(|percent| Confidence::Score(percent / 100.0))
            .ok_or_else(|| serde::de::Error::custom(format!("invalid confidence: {raw}")))
    }
}

/// Outcome of classifying one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Matched intent label, or [`UNKNOWN_INTENT`].
    pub intent: String,
    /// Confidence of the decision.
    pub confidence: Confidence,
}

impl ClassificationResult {
    /// A match on `intent`.
    pub fn matched<S: Into<String>>(intent: S, similarity: f64) -> Self {
        ClassificationResult {
            intent: intent.into(),
            confidence: Confidence::Score(similarity),
        }
    }

    /// No intent was similar enough; `similarity` is the best score seen.
    pub fn unknown(similarity: f64) -> Self {
        ClassificationResult {
            intent: UNKNOWN_INTENT.to_string(),
            confidence: Confidence::Score(similarity),
        }
    }

    /// The query was rejected before similarity matching.
    pub fn rejected() -> Self {
        ClassificationResult {
            intent: UNKNOWN_INTENT.to_string(),
            confidence: Confidence::Rejected,
        }
    }

    /// Whether the result is the `"unknown"` sentinel.
    pub fn is_unknown(&self) -> bool {
        self.intent == UNKNOWN_INTENT
    }
}
