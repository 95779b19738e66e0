//! What a turn shows the user.

use std::fmt;

use serde::Serialize;

use larder_matcher::MatchResult;

use crate::node::Node;

/// Why the assistant asks the user to try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarificationReason {
    /// No ingredient could be read from the message.
    EmptyQuery,
    /// The ingredients matched no recipe.
    NoMatches,
    /// The selection is not one of the presented recipes.
    RecipeNotFound,
}

/// Front-end-neutral reply of a turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayPayload {
    /// Fixed reply for off-topic requests.
    Decline { message: String },
    /// Ranked recipes, best first.
    Matches {
        ingredients: Vec<String>,
        matches: Vec<MatchResult>,
    },
    /// Steps of the selected recipe, in order.
    Instructions {
        recipe_id: String,
        name: String,
        steps: Vec<String>,
    },
    Clarification {
        reason: ClarificationReason,
        message: String,
    },
    /// The classifier could not be reached; the same message may be resent.
    Unavailable {
        message: String,
        attempts: u32,
        /// Last error reported by the classifier.
        cause: String,
    },
    /// The turn could not be completed.
    Failure { message: String },
}

impl fmt::Display for DisplayPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decline { message }
            | Self::Clarification { message, .. }
            | Self::Unavailable { message, .. }
            | Self::Failure { message } => f.write_str(message),
            Self::Matches {
                ingredients,
                matches,
            } => {
                writeln!(f, "Recipes for {}:", ingredients.join(", "))?;
                for (i, m) in matches.iter().enumerate() {
                    write!(f, "\n{}. {} [{}]", i + 1, m.name, m.recipe_id)?;
                    writeln!(
                        f,
                        " ({}/{} ingredients, {:.0}%)",
                        m.overlap,
                        m.ingredient_count,
                        m.ratio * 100.0
                    )?;
                    writeln!(f, "   Uses: {}", join(&m.matched))?;
                    if !m.missing.is_empty() {
                        writeln!(f, "   Missing: {}", join(&m.missing))?;
                    }
                    let mut details = Vec::new();
                    if let Some(minutes) = m.cooking_time {
                        details.push(format!("Time: {minutes} min"));
                    }
                    if let Some(cuisine) = &m.cuisine {
                        details.push(format!("Cuisine: {cuisine}"));
                    }
                    if !details.is_empty() {
                        writeln!(f, "   {}", details.join(" | "))?;
                    }
                }
                write!(f, "\nReply with a number, id or name to see the steps.")
            }
            Self::Instructions { name, steps, .. } => {
                writeln!(f, "{name}")?;
                for (i, step) in steps.iter().enumerate() {
                    write!(f, "\n{}. {step}", i + 1)?;
                }
                Ok(())
            }
        }
    }
}

fn join<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnResult {
    /// Node the turn ended on (`Error` when it failed).
    pub state: Node,
    pub payload: DisplayPayload,
    /// Recipe ids that are valid selections for the next turn.
    pub available_selections: Vec<String>,
    /// Nodes visited during the turn, starting with the resting node.
    pub path: Vec<Node>,
}

impl TurnResult {
    pub fn is_error(&self) -> bool {
        self.state == Node::Error
    }

    /// Whether resending the same text may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.payload, DisplayPayload::Unavailable { .. })
    }

    /// Whether the turn passed through `node`.
    pub fn visited(&self, node: Node) -> bool {
        self.path.contains(&node)
    }
}
