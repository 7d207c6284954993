//! Two-stage garbage gate in front of the embedding strategy.
//!
//! 1. A query without any vowel (`aeiou`, case-insensitive) is rejected
//!    locally, without calling anything.
//! 2. Otherwise the [`QueryValidator`] decides. A validator error or timeout
//!    counts as a rejection and is only logged.

use std::sync::Arc;

use log::{debug, warn};

use crate::retry::CallPolicy;
use crate::validation::QueryValidator;

/// Outcome of [`GarbageFilter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GarbageVerdict {
    /// The query may be classified.
    Accept,
    /// The query contains no vowel.
    RejectNoVowel,
    /// The validator judged the query incoherent.
    RejectIncoherent,
    /// The validator failed; the query is rejected.
    RejectValidatorError,
}

impl GarbageVerdict {
    /// Whether the query must not be classified.
    pub fn is_rejected(&self) -> bool {
        !matches!(self, GarbageVerdict::Accept)
    }
}

/// Whether `text` contains at least one of `aeiou`, in any case.
pub fn has_vowel(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
}

/// Fail-closed garbage gate.
#[derive(Clone)]
pub struct GarbageFilter {
    validator: Arc<dyn QueryValidator>,
    policy: CallPolicy,
}

impl std::fmt::Debug for GarbageFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GarbageFilter")
            .field("validator", &self.validator.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl GarbageFilter {
    /// Create a filter asking `validator`, each call bounded by `policy`.
    pub fn new(validator: Arc<dyn QueryValidator>, policy: CallPolicy) -> Self {
        GarbageFilter { validator, policy }
    }

    /// Run both stages on `query`. Never fails.
    pub async fn check(&self, query: &str) -> GarbageVerdict {
        if !has_vowel(query) {
            debug!("Rejected query without vowels: {query:?}");
            return GarbageVerdict::RejectNoVowel;
        }

        let validator = &self.validator;
        match self
            .policy
            .run("query validation", move || validator.validate(query))
            .await
        {
            Ok(true) => GarbageVerdict::Accept,
            Ok(false) => {
                debug!("Validator {} rejected query {query:?}", validator.name());
                GarbageVerdict::RejectIncoherent
            }
            Err(e) => {
                warn!(
                    "Validator {} failed, rejecting query {query:?}: {e}",
                    validator.name()
                );
                GarbageVerdict::RejectValidatorError
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::error::{IntentError, Result};

    enum Answer {
        Valid,
        Invalid,
        Fail,
        Hang,
    }

    struct Scripted {
        answer: Answer,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(answer: Answer) -> Arc<Self> {
            Arc::new(Scripted {
                answer,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl QueryValidator for Scripted {
        async fn validate(&self, _query: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.answer {
                Answer::Valid => Ok(true),
                Answer::Invalid => Ok(false),
                Answer::Fail => Err(IntentError::validator_unavailable("down")),
                Answer::Hang => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(true)
                }
            }
        }
    }

    fn filter(validator: Arc<Scripted>) -> GarbageFilter {
        let policy = CallPolicy {
            timeout: Some(Duration::from_millis(50)),
            ..CallPolicy::default()
        };
        GarbageFilter::new(validator, policy)
    }

    #[test]
    fn test_has_vowel() {
        assert!(has_vowel("book a flight"));
        assert!(has_vowel("XYZA"));
        assert!(!has_vowel("xyz qrst"));
        assert!(!has_vowel(""));
        assert!(!has_vowel("123 ?!"));
    }

    #[tokio::test]
    async fn test_no_vowel_skips_validator() {
        let validator = Scripted::new(Answer::Valid);
        let verdict = filter(validator.clone()).check("zzzz").await;
        assert_eq!(verdict, GarbageVerdict::RejectNoVowel);
        assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_validator_decides() {
        let valid = Scripted::new(Answer::Valid);
        assert_eq!(
            filter(valid.clone()).check("book a flight").await,
            GarbageVerdict::Accept
        );
        assert_eq!(valid.calls.load(Ordering::SeqCst), 1);

        let invalid = Scripted::new(Answer::Invalid);
        let verdict = filter(invalid).check("asdf qwer").await;
        assert_eq!(verdict, GarbageVerdict::RejectIncoherent);
        assert!(verdict.is_rejected());
    }

    #[tokio::test]
    async fn test_fails_closed() {
        let failing = Scripted::new(Answer::Fail);
        assert_eq!(
            filter(failing).check("book a flight").await,
            GarbageVerdict::RejectValidatorError
        );

        let hanging = Scripted::new(Answer::Hang);
        assert_eq!(
            filter(hanging).check("book a flight").await,
            GarbageVerdict::RejectValidatorError
        );
    }
}
