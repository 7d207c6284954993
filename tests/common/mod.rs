#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use hybrid_intent::classifier::strategy::EmbeddingBackends;
use hybrid_intent::classifier::types::Example;
use hybrid_intent::embedding::EmbeddingProvider;
use hybrid_intent::error::{IntentError, Result};
use hybrid_intent::similarity::token_set;
use hybrid_intent::validation::QueryValidator;

pub const DIMENSION: usize = 16;

pub fn travel_dataset() -> Vec<Example> {
    vec![
        Example::new("How do I book a flight?", "book_flight"),
        Example::new("I need to reserve a ticket", "book_flight"),
        Example::new("What's the weather like?", "weather_query"),
    ]
}

/// Hashes word tokens into a fixed number of buckets.
#[derive(Default)]
pub struct HashingProvider {
    failing: Mutex<Vec<String>>,
    pub requests: AtomicUsize,
    pub texts: AtomicUsize,
}

impl HashingProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on(&self, text: &str) {
        self.failing.lock().push(text.to_string());
    }

    pub fn recover(&self) {
        self.failing.lock().clear();
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

pub fn hash_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMENSION];
    for token in token_set(text) {
        let bucket = token
            .bytes()
            .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(usize::from(b)))
            % DIMENSION;
        vector[bucket] += 1.0;
    }
    vector
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(text) = texts
            .iter()
            .find(|text| self.failing.lock().iter().any(|f| f == *text))
        {
            return Err(IntentError::provider(format!("refusing {text:?}")));
        }
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|text| hash_vector(text)).collect())
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Accepts every query and counts calls.
#[derive(Default)]
pub struct CountingValidator {
    pub calls: AtomicUsize,
}

impl CountingValidator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryValidator for CountingValidator {
    async fn validate(&self, _query: &str) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

pub fn backends(
    provider: &Arc<HashingProvider>,
    validator: &Arc<CountingValidator>,
) -> EmbeddingBackends {
    EmbeddingBackends::new(provider.clone(), validator.clone())
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
