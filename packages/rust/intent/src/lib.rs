//! Intent classification for larder.
//!
//! The conversation only needs to know whether a message is about food.
//! [`IntentClassifier`] is that capability; any backend (remote LLM, local
//! heuristic, test stub) can stand behind it. The trait is object-safe so
//! the conversation holds an `Arc<dyn IntentClassifier>`.

mod keyword;
mod openrouter;
mod retry;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use larder_shared::Result;

pub use keyword::KeywordClassifier;
pub use openrouter::OpenRouterClassifier;
pub use retry::{ClassifierExhausted, RetryPolicy, classify_with_retry};

/// Outcome of classifying a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// About food, cooking, recipes or diet.
    OnTopic,
    /// Anything else.
    OffTopic,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OnTopic => "on_topic",
            Self::OffTopic => "off_topic",
        };
        f.write_str(s)
    }
}

/// Decides whether a message is food-related.
///
/// Implementations report transient trouble as
/// [`LarderError::ClassifierUnavailable`](larder_shared::LarderError::ClassifierUnavailable)
/// (or `Network`); callers retry those via [`classify_with_retry`].
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Short name for logs (e.g. "openrouter").
    fn name(&self) -> &str;

    /// Classify one message.
    async fn classify(&self, text: &str) -> Result<Verdict>;
}

// Compile-time assertion: IntentClassifier must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn IntentClassifier) {}
};
