//! Query validation: deciding whether a query is coherent enough to classify.
//!
//! A [`QueryValidator`] answers a single yes/no question about a query. The
//! [`garbage::GarbageFilter`] combines a cheap local heuristic with a
//! validator and turns every validator failure into a rejection.

use async_trait::async_trait;

use crate::error::Result;

pub mod garbage;
#[cfg(feature = "openai")]
pub mod openai;

/// Judge of query coherence.
#[async_trait]
pub trait QueryValidator: Send + Sync {
    /// `Ok(true)` when `query` is a coherent request, `Ok(false)` when it is
    /// gibberish. Errors mean no verdict could be obtained.
    async fn validate(&self, query: &str) -> Result<bool>;

    /// Get the name/identifier of this validator, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}
