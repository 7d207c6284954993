//! Error types for the hybrid-intent library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`IntentError`] enum. Low classification confidence is never an error: it
//! is reported as an `"unknown"` result.
//!
//! # Examples
//!
//! ```
//! use hybrid_intent::error::{IntentError, Result};
//!
//! fn add(text: &str) -> Result<()> {
//!     if text.is_empty() {
//!         return Err(IntentError::invalid_argument("text must not be empty"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(add("").is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for classification, mutation and persistence.
#[derive(Error, Debug)]
pub enum IntentError {
    /// I/O errors (file operations, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A caller supplied an invalid argument (e.g. an empty intent label).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The embedding provider failed (transport, quota, malformed response).
    #[error("Embedding provider error: {0}")]
    Provider(String),

    /// The query validator could not produce an answer.
    #[error("Query validator unavailable: {0}")]
    ValidatorUnavailable(String),

    /// An external call exceeded its time budget.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Embedding vectors with inconsistent dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the vectors already stored.
        expected: usize,
        /// Dimension of the rejected vector.
        actual: usize,
    },

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with IntentError.
pub type Result<T> = std::result::Result<T, IntentError>;

impl IntentError {
    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        IntentError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        IntentError::InvalidConfig(msg.into())
    }

    /// Create a new provider error.
    pub fn provider<S: Into<String>>(msg: S) -> Self {
        IntentError::Provider(msg.into())
    }

    /// Create a new validator unavailable error.
    pub fn validator_unavailable<S: Into<String>>(msg: S) -> Self {
        IntentError::ValidatorUnavailable(msg.into())
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        IntentError::Timeout(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        IntentError::Storage(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        IntentError::Other(msg.into())
    }

    /// Whether retrying the failed call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            IntentError::Provider(_)
                | IntentError::ValidatorUnavailable(_)
                | IntentError::Timeout(_)
                | IntentError::Io(_)
        )
    }
}
