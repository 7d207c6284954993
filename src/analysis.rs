//! Text analysis shared by the lexical index and the secondary Jaccard check.
//!
//! Analysis is deliberately simple: text is split on non-word-character
//! boundaries and lower-cased. Both the TF-IDF model and the token-set
//! comparison go through the same [`Analyzer`](analyzer::Analyzer) so their
//! notion of a "term" never drifts apart.

pub mod analyzer;
pub mod token;
pub mod tokenizer;
