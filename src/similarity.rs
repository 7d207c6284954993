//! Numeric similarity routines used by both classification strategies.
//!
//! Both measures are total: degenerate inputs resolve to `0.0` instead of an
//! error or `NaN`.
//!
//! - [`cosine`]: zero-norm vectors and vectors of different length score `0.0`.
//! - [`jaccard`]: an empty union scores `0.0`.

use std::collections::HashSet;
use std::hash::{BuildHasher, Hash};

use crate::analysis::analyzer::{Analyzer, WordAnalyzer};

/// Cosine similarity `dot(a,b) / (‖a‖·‖b‖)`, clamped to `[-1, 1]`.
///
/// Works for `f32` embeddings and `f64` TF-IDF vectors alike; accumulation is
/// always done in `f64`.
///
/// # Examples
///
/// ```
/// use hybrid_intent::similarity::cosine;
///
/// assert_eq!(cosine(&[1.0f32, 0.0], &[1.0, 0.0]), 1.0);
/// assert_eq!(cosine(&[1.0f64, 0.0], &[0.0, 1.0]), 0.0);
/// assert_eq!(cosine(&[0.0f64, 0.0], &[1.0, 1.0]), 0.0);
/// ```
pub fn cosine<T: Copy + Into<f64>>(a: &[T], b: &[T]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y): (f64, f64) = (x.into(), y.into());
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Jaccard similarity `|A∩B| / |A∪B|`; `0.0` when both sets are empty.
pub fn jaccard<T, S>(a: &HashSet<T, S>, b: &HashSet<T, S>) -> f64
where
    T: Eq + Hash,
    S: BuildHasher,
{
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Index and value of the highest score; the earliest index wins ties.
///
/// `NaN` scores never win. Returns `None` for an empty input.
pub fn best_score<I>(scores: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = f64>,
{
    let mut best: Option<(usize, f64)> = None;
    for (idx, score) in scores.into_iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((idx, score));
        }
    }
    best
}

/// Lower-cased word tokens of `text`, deduplicated.
pub fn token_set(text: &str) -> HashSet<String> {
    // The word analyzer cannot fail; an error would only come from a custom tokenizer.
    WordAnalyzer::new().term_set(text).unwrap_or_default()
}

/// Jaccard similarity between the token sets of two texts.
pub fn text_jaccard(a: &str, b: &str) -> f64 {
    jaccard(&token_set(a), &token_set(b))
}
