//! Test helpers: fixture catalog and scripted classifiers.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use larder_catalog::{RecipeCatalog, load_catalog};
use larder_intent::{IntentClassifier, RetryPolicy, Verdict};
use larder_shared::{LarderError, Result};

use crate::graph::{ConversationGraph, GraphConfig};

pub(crate) fn fixture_catalog() -> Arc<RecipeCatalog> {
    let path = Path::new("../../../fixtures/json/recipes.fixture.json");
    Arc::new(load_catalog(path).expect("load fixture catalog"))
}

/// One scripted classifier answer.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Outcome {
    Answer(Verdict),
    Unavailable,
    /// Permanent refusal, as for a rejected API key.
    Refused,
}

/// Plays back scripted outcomes, then keeps answering `fallback`.
pub(crate) struct ScriptedClassifier {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Verdict,
    calls: AtomicU32,
}

impl ScriptedClassifier {
    pub(crate) fn answering(fallback: Verdict) -> Arc<Self> {
        Self::scripted([], fallback)
    }

    pub(crate) fn scripted(
        script: impl IntoIterator<Item = Outcome>,
        fallback: Verdict,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            calls: AtomicU32::new(0),
        })
    }

    pub(crate) fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentClassifier for ScriptedClassifier {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn classify(&self, _text: &str) -> Result<Verdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().expect("script lock").pop_front();
        match next.unwrap_or(Outcome::Answer(self.fallback)) {
            Outcome::Answer(verdict) => Ok(verdict),
            Outcome::Unavailable => Err(LarderError::unavailable("model overloaded")),
            Outcome::Refused => Err(LarderError::config("classifier rejected the API key (HTTP 401)")),
        }
    }
}

pub(crate) fn test_config() -> GraphConfig {
    GraphConfig {
        retry: RetryPolicy {
            timeout: Duration::from_secs(1),
            max_attempts: 3,
            backoff: Duration::ZERO,
        },
        ..GraphConfig::default()
    }
}

pub(crate) fn graph_with(
    catalog: Arc<RecipeCatalog>,
    classifier: Arc<ScriptedClassifier>,
) -> ConversationGraph {
    ConversationGraph::new(catalog, classifier, test_config())
}
