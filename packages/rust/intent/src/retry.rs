//! Timeout and bounded retry around a classifier call.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use larder_shared::ClassifierConfig;

use crate::{IntentClassifier, Verdict};

/// How long to wait for a verdict and how often to try.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Attempts before giving up (at least one attempt is always made).
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ClassifierConfig::default())
    }
}

impl From<&ClassifierConfig> for RetryPolicy {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            max_attempts: config.max_attempts,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// The classifier produced no verdict within the policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("classifier unavailable after {attempts} attempt(s): {last_error}")]
pub struct ClassifierExhausted {
    pub attempts: u32,
    pub last_error: String,
    /// Whether resending the same text may succeed. False when the
    /// classifier refused the request outright (e.g. a rejected API key).
    pub transient: bool,
}

/// Classify `text`, retrying transient failures and timeouts.
///
/// Non-transient errors (e.g. a rejected API key) stop immediately.
#[instrument(skip_all, fields(classifier = classifier.name(), max_attempts = policy.max_attempts))]
pub async fn classify_with_retry(
    classifier: &dyn IntentClassifier,
    text: &str,
    policy: &RetryPolicy,
) -> Result<Verdict, ClassifierExhausted> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match tokio::time::timeout(policy.timeout, classifier.classify(text)).await {
            Ok(Ok(verdict)) => {
                debug!(attempt, %verdict, "intent classified");
                return Ok(verdict);
            }
            Ok(Err(e)) if !e.is_transient() => {
                warn!(attempt, error = %e, "classifier failed, not retrying");
                return Err(ClassifierExhausted {
                    attempts: attempt,
                    last_error: e.to_string(),
                    transient: false,
                });
            }
            Ok(Err(e)) => last_error = e.to_string(),
            Err(_) => {
                last_error = format!("timed out after {}ms", policy.timeout.as_millis());
            }
        }

        warn!(attempt, max_attempts, error = %last_error, "classifier attempt failed");

        if attempt < max_attempts && !policy.backoff.is_zero() {
            tokio::time::sleep(policy.backoff).await;
        }
    }

    Err(ClassifierExhausted {
        attempts: max_attempts,
        last_error,
        transient: true,
    })
}
