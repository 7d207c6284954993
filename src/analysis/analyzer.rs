//! Analyzers combine a tokenizer with token normalization.
//!
//! ```text
//! Raw Text → Tokenizer → lower-case → drop empty → terms
//! ```
//!
//! # Examples
//!
//! ```
//! use hybrid_intent::analysis::analyzer::{Analyzer, WordAnalyzer};
//!
//! let analyzer = WordAnalyzer::new();
//! let terms = analyzer.terms("How do I book a Flight?").unwrap();
//! assert_eq!(terms, vec!["how", "do", "i", "book", "a", "flight"]);
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::tokenizer::{RegexTokenizer, Tokenizer};
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;

    /// Analyze `text` and collect the term strings in order.
    fn terms(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyze(text)?.map(|token| token.text).collect())
    }

    /// Analyze `text` and collect the distinct terms.
    fn term_set(&self, text: &str) -> Result<HashSet<String>> {
        Ok(self.analyze(text)?.map(|token| token.text).collect())
    }
}

/// Splits on non-word characters and lower-cases every token.
#[derive(Clone)]
pub struct WordAnalyzer {
    tokenizer: Arc<dyn Tokenizer>,
}

impl WordAnalyzer {
    /// Create an analyzer backed by the default `\w+` tokenizer.
    pub fn new() -> Self {
        WordAnalyzer {
            tokenizer: Arc::new(RegexTokenizer::new()),
        }
    }

    /// Create an analyzer with a custom tokenizer.
    pub fn with_tokenizer(tokenizer: Arc<dyn Tokenizer>) -> Self {
        WordAnalyzer { tokenizer }
    }

    /// Get the tokenizer used by this analyzer.
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }
}

impl Default for WordAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for WordAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        let tokens: Vec<Token> = self
            .tokenizer
            .tokenize(text)?
            .map(|mut token| {
                token.text = token.text.to_lowercase();
                token
            })
            .filter(|token| !token.is_empty())
            .collect();

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "word"
    }
}

impl std::fmt::Debug for WordAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordAnalyzer")
            .field("tokenizer", &self.tokenizer.name())
            .finish()
    }
}
