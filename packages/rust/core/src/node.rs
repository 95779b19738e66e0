//! Conversation graph nodes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A node of the conversation graph.
///
/// ```text
/// Start ──text──▶ AwaitingIntentDecision ──off-topic──▶ Declined
///                        │            └──failure──▶ Error
///                     on-topic
///                        ▼
///               AwaitingIngredients ◀──────────────────────────┐
///                        │ parsed                              │ fresh
///                        ▼                                     │ ingredients
///                     Ranking ──none──▶ NoMatches              │
///                        │ found                               │
///                        ▼                                     │
///               PresentingMatches ──▶ AwaitingSelection ──▶ PresentingInstructions
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Start,
    AwaitingIntentDecision,
    /// Off-topic request declined. Further input is classified again.
    Declined,
    AwaitingIngredients,
    Ranking,
    PresentingMatches,
    AwaitingSelection,
    PresentingInstructions,
    /// Ranking found nothing; behaves like `AwaitingIngredients`.
    NoMatches,
    /// A turn failed. Only ever reported, never stored in a session.
    Error,
}

impl Node {
    pub const ALL: [Node; 10] = [
        Node::Start,
        Node::AwaitingIntentDecision,
        Node::Declined,
        Node::AwaitingIngredients,
        Node::Ranking,
        Node::PresentingMatches,
        Node::AwaitingSelection,
        Node::PresentingInstructions,
        Node::NoMatches,
        Node::Error,
    ];

    /// Nodes a session may rest on between turns.
    pub fn is_resting(self) -> bool {
        matches!(
            self,
            Node::Start
                | Node::Declined
                | Node::AwaitingIngredients
                | Node::NoMatches
                | Node::AwaitingSelection
                | Node::PresentingInstructions
        )
    }

    /// Nodes from which the last presented recipes can be selected.
    pub fn accepts_selection(self) -> bool {
        matches!(self, Node::AwaitingSelection | Node::PresentingInstructions)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Node::Start => "start",
            Node::AwaitingIntentDecision => "awaiting_intent_decision",
            Node::Declined => "declined",
            Node::AwaitingIngredients => "awaiting_ingredients",
            Node::Ranking => "ranking",
            Node::PresentingMatches => "presenting_matches",
            Node::AwaitingSelection => "awaiting_selection",
            Node::PresentingInstructions => "presenting_instructions",
            Node::NoMatches => "no_matches",
            Node::Error => "error",
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown node name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node: {0}")]
pub struct UnknownNode(pub String);

impl FromStr for Node {
    type Err = UnknownNode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Node::ALL
            .into_iter()
            .find(|node| node.as_str() == s)
            .ok_or_else(|| UnknownNode(s.to_string()))
    }
}
