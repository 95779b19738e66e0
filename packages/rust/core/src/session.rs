//! Per-conversation state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use larder_matcher::MatchResult;
use larder_shared::SessionId;

use crate::node::Node;

/// Who said something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// State of one conversation.
///
/// Owned by exactly one session and changed only by
/// [`ConversationGraph::submit_turn`](crate::ConversationGraph::submit_turn).
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub(crate) id: SessionId,
    pub(crate) node: Node,
    pub(crate) history: Vec<Turn>,
    /// Presented recipes, best first. These are the valid selections.
    pub(crate) last_results: Vec<MatchResult>,
    /// Ingredients the last ranking was computed for.
    pub(crate) last_ingredients: Vec<String>,
    pub(crate) selected: Option<String>,
    pub(crate) intent_confirmed: bool,
    pub(crate) created_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            node: Node::Start,
            history: Vec::new(),
            last_results: Vec::new(),
            last_ingredients: Vec::new(),
            selected: None,
            intent_confirmed: false,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Resting node the next turn starts from.
    pub fn node(&self) -> Node {
        self.node
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn last_results(&self) -> &[MatchResult] {
        &self.last_results
    }

    pub fn last_ingredients(&self) -> &[String] {
        &self.last_ingredients
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Whether a message of this session has been classified on-topic.
    pub fn intent_confirmed(&self) -> bool {
        self.intent_confirmed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Recipe ids the next turn may select.
    pub fn available_selections(&self) -> Vec<String> {
        if !self.node.accepts_selection() {
            return Vec::new();
        }
        self.last_results
            .iter()
            .map(|m| m.recipe_id.clone())
            .collect()
    }

    pub(crate) fn record(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.history.push(Turn {
            speaker,
            text: text.into(),
            at: Utc::now(),
        });
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
