//! Timeout and retry policy for calls to external collaborators.
//!
//! Every embedding or validation request runs under a [`CallPolicy`]: the call
//! is bounded by `timeout`, and transient failures (see
//! [`IntentError::is_transient`]) are retried up to `max_retries` times with
//! exponential backoff plus jitter. With `max_retries == 0` a call is made
//! exactly once.

use std::future::Future;
use std::time::Duration;

use log::warn;
use rand::Rng;

use crate::error::{IntentError, Result};

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How external calls are bounded and retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    /// Time budget of one attempt; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Base delay before the first retry, doubled on every further retry.
    pub backoff: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        CallPolicy {
            timeout: Some(Duration::from_secs(30)),
            max_retries: 0,
            backoff: Duration::from_millis(200),
        }
    }
}

impl CallPolicy {
    /// A policy that never times out and never retries.
    pub fn unbounded() -> Self {
        CallPolicy {
            timeout: None,
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Run `op` under this policy. `what` names the call in logs and errors.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            let outcome = match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, op()).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(IntentError::timeout(format!(
                        "{what} did not complete within {limit:?}"
                    ))),
                },
                None => op().await,
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        "{what} failed (attempt {attempt}/{}): {e}; retrying in {delay:?}",
                        self.max_retries + 1
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// `backoff * 2^attempt` plus up to one `backoff` of jitter, capped.
    fn delay_for(&self, attempt: u32) -> Duration {
        if self.backoff.is_zero() {
            return Duration::ZERO;
        }
        let exponential = self
            .backoff
            .saturating_mul(2u32.saturating_pow(attempt.min(16)));
        let base_ms = self.backoff.as_millis().min(u64::MAX as u128) as u64;
        let jitter = Duration::from_millis(rand::rng().random_range(0..=base_ms));
        exponential.saturating_add(jitter).min(MAX_BACKOFF)
    }
}
