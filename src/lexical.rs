//! TF-IDF lexical index over the example utterances.
//!
//! The index keeps the term ordering and the document frequency of every
//! term. IDF weights are derived on demand, so a
//! vector returned by [`LexicalIndex::vectorize`] is only comparable with
//! vectors produced against the same corpus state. Callers must not cache
//! document vectors across mutations.
//!
//! Documents can be appended one at a time; there is no incremental removal,
//! use [`LexicalIndex::rebuild`] instead.

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};

use crate::analysis::analyzer::{Analyzer, WordAnalyzer};
use crate::error::Result;

/// TF-IDF model over an ordered corpus.
pub struct LexicalIndex {
    /// Term -> position in the term ordering (first appearance order).
    vocabulary: AHashMap<String, usize>,
    /// Number of documents containing each term, indexed like `vocabulary`.
    document_frequency: Vec<usize>,
    /// Number of documents added since the last rebuild.
    n_documents: usize,
    /// Analyzer for tokenization.
    analyzer: Arc<dyn Analyzer>,
}

impl std::fmt::Debug for LexicalIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LexicalIndex")
            .field("vocabulary_size", &self.vocabulary.len())
            .field("n_documents", &self.n_documents)
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

impl Default for LexicalIndex {
    fn default() -> Self {
        Self::new(Arc::new(WordAnalyzer::new()))
    }
}

impl LexicalIndex {
    /// Create an empty index with the specified analyzer.
    pub fn new(analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            vocabulary: AHashMap::new(),
            document_frequency: Vec::new(),
            n_documents: 0,
            analyzer,
        }
    }

    /// Build an index over `documents`, in order.
    pub fn from_documents<I, S>(analyzer: Arc<dyn Analyzer>, documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::new(analyzer);
        for doc in documents {
            index.add_document(doc.as_ref())?;
        }
        Ok(index)
    }

    /// Append one document to the corpus.
    pub fn add_document(&mut self, text: &str) -> Result<()> {
        let mut seen = AHashSet::new();
        for term in self.analyzer.terms(text)? {
            if !seen.insert(term.clone()) {
                continue;
            }
            match self.vocabulary.get(&term) {
                Some(&idx) => self.document_frequency[idx] += 1,
                None => {
                    self.vocabulary.insert(term, self.document_frequency.len());
                    self.document_frequency.push(1);
                }
            }
        }
        self.n_documents += 1;

        Ok(())
    }

    /// Clear the corpus and re-add every document in order.
    pub fn rebuild<I, S>(&mut self, documents: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.vocabulary.clear();
        self.document_frequency.clear();
        self.n_documents = 0;

        for doc in documents {
            self.add_document(doc.as_ref())?;
        }

        Ok(())
    }

    /// Transform a text into its TF-IDF vector over the current term ordering.
    ///
    /// Terms unknown to the corpus are ignored, so a text sharing no term with
    /// the corpus maps to the zero vector.
    pub fn vectorize(&self, text: &str) -> Result<Vec<f64>> {
        let tokens = self.analyzer.terms(text)?;
        let mut tf = vec![0.0; self.vocabulary.len()];

        for token in &tokens {
            if let Some(&idx) = self.vocabulary.get(token) {
                tf[idx] += 1.0;
            }
        }

        let doc_length = tokens.len() as f64;
        if doc_length > 0.0 {
            for count in &mut tf {
                *count /= doc_length;
            }
        }

        for (idx, weight) in tf.iter_mut().enumerate() {
            *weight *= self.idf(idx);
        }

        Ok(tf)
    }

    /// Smoothed inverse document frequency: `ln((N + 1) / (df + 1)) + 1`.
    fn idf(&self, idx: usize) -> f64 {
        let df = self.document_frequency[idx] as f64;
        ((self.n_documents as f64 + 1.0) / (df + 1.0)).ln() + 1.0
    }

    /// Number of documents in the corpus.
    pub fn document_count(&self) -> usize {
        self.n_documents
    }

    /// Get the size of the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Whether the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.n_documents == 0
    }

    /// The analyzer used to extract terms.
    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }
}
