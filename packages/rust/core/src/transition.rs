//! Pure transition function of the conversation graph.
//!
//! `transition(node, event)` decides the next node and the single effect the
//! driver must perform there. It performs no I/O; effects that produce new
//! information (classifying, parsing, ranking, resolving a selection) feed
//! their outcome back as the next [`Event`].

use larder_intent::Verdict;
use larder_matcher::UserQuery;

use crate::node::Node;

/// Something that happened during a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The user sent a message.
    TextReceived,
    Classified(Verdict),
    /// The classifier gave no verdict within the retry policy.
    ClassifierFailed,
    IngredientsParsed(UserQuery),
    NothingParsed,
    Ranked { found: bool },
    Presented,
    SelectionResolved { recipe_id: String },
    SelectionRejected,
    /// A message that is not a selection but names known ingredients.
    FreshIngredients,
}

/// Work the driver performs after entering a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Classify,
    Decline,
    ReportUnavailable,
    ExtractIngredients,
    Rank(UserQuery),
    PresentMatches,
    ResolveSelection,
    RenderInstructions { recipe_id: String },
    RequestIngredients,
    RequestOtherIngredients,
    RejectSelection,
    AwaitSelection,
}

impl Effect {
    /// Effects that produce the turn's reply; the driver stops after them.
    pub fn ends_turn(&self) -> bool {
        matches!(
            self,
            Effect::Decline
                | Effect::ReportUnavailable
                | Effect::RenderInstructions { .. }
                | Effect::RequestIngredients
                | Effect::RequestOtherIngredients
                | Effect::RejectSelection
                | Effect::AwaitSelection
        )
    }
}

/// Outcome of [`transition`].
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: Node,
    pub effect: Effect,
}

impl Transition {
    fn to(next: Node, effect: Effect) -> Self {
        Self { next, effect }
    }
}

/// The event is not an edge out of the node.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid transition from {from} on {event}")]
pub struct InvalidTransition {
    pub from: Node,
    pub event: String,
}

/// Apply `event` at `node`.
pub fn transition(node: Node, event: Event) -> Result<Transition, InvalidTransition> {
    use Node::*;

    let step = match (node, event) {
        (Start | Declined, Event::TextReceived) => {
            Transition::to(AwaitingIntentDecision, Effect::Classify)
        }

        (AwaitingIntentDecision, Event::Classified(Verdict::OnTopic)) => {
            Transition::to(AwaitingIngredients, Effect::ExtractIngredients)
        }
        (AwaitingIntentDecision, Event::Classified(Verdict::OffTopic)) => {
            Transition::to(Declined, Effect::Decline)
        }
        (AwaitingIntentDecision, Event::ClassifierFailed) => {
            Transition::to(Error, Effect::ReportUnavailable)
        }

        (AwaitingIngredients | NoMatches, Event::TextReceived) => {
            Transition::to(AwaitingIngredients, Effect::ExtractIngredients)
        }
        (AwaitingIngredients, Event::IngredientsParsed(query)) => {
            Transition::to(Ranking, Effect::Rank(query))
        }
        (AwaitingIngredients, Event::NothingParsed) => {
            Transition::to(AwaitingIngredients, Effect::RequestIngredients)
        }

        (Ranking, Event::Ranked { found: true }) => {
            Transition::to(PresentingMatches, Effect::PresentMatches)
        }
        (Ranking, Event::Ranked { found: false }) => {
            Transition::to(NoMatches, Effect::RequestOtherIngredients)
        }

        (PresentingMatches, Event::Presented) => {
            Transition::to(AwaitingSelection, Effect::AwaitSelection)
        }

        (from @ (AwaitingSelection | PresentingInstructions), Event::TextReceived) => {
            Transition::to(from, Effect::ResolveSelection)
        }
        (AwaitingSelection | PresentingInstructions, Event::SelectionResolved { recipe_id }) => {
            Transition::to(PresentingInstructions, Effect::RenderInstructions { recipe_id })
        }
        (from @ (AwaitingSelection | PresentingInstructions), Event::SelectionRejected) => {
            Transition::to(from, Effect::RejectSelection)
        }
        (AwaitingSelection | PresentingInstructions, Event::FreshIngredients) => {
            Transition::to(AwaitingIngredients, Effect::ExtractIngredients)
        }

        (from, event) => {
            return Err(InvalidTransition {
                from,
                event: format!("{event:?}"),
            });
        }
    };

    Ok(step)
}

/// Whether some event leads from `from` to `to` in one step.
pub fn is_valid_transition(from: Node, to: Node) -> bool {
    use Node::*;

    matches!(
        (from, to),
        (Start | Declined, AwaitingIntentDecision)
            | (AwaitingIntentDecision, AwaitingIngredients | Declined | Error)
            | (AwaitingIngredients | NoMatches, AwaitingIngredients)
            | (AwaitingIngredients, Ranking)
            | (Ranking, PresentingMatches | NoMatches)
            | (PresentingMatches, AwaitingSelection)
            | (AwaitingSelection, AwaitingSelection)
            | (
                AwaitingSelection | PresentingInstructions,
                PresentingInstructions | AwaitingIngredients
            )
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(node: Node, event: Event) -> Transition {
        transition(node, event).unwrap()
    }

    #[test]
    fn first_text_is_classified() {
        for node in [Node::Start, Node::Declined] {
            let t = step(node, Event::TextReceived);
            assert_eq!(t.next, Node::AwaitingIntentDecision);
            assert_eq!(t.effect, Effect::Classify);
        }
    }

    #[test]
    fn verdicts_route_the_request() {
        let on = step(Node::AwaitingIntentDecision, Event::Classified(Verdict::OnTopic));
        assert_eq!(on.next, Node::AwaitingIngredients);
        assert_eq!(on.effect, Effect::ExtractIngredients);

        let off = step(Node::AwaitingIntentDecision, Event::Classified(Verdict::OffTopic));
        assert_eq!(off.next, Node::Declined);
        assert_eq!(off.effect, Effect::Decline);

        let failed = step(Node::AwaitingIntentDecision, Event::ClassifierFailed);
        assert_eq!(failed.next, Node::Error);
        assert_eq!(failed.effect, Effect::ReportUnavailable);
    }

    #[test]
    fn ingredient_flow() {
        let query = UserQuery::parse("egg, flour");
        let t = step(Node::AwaitingIngredients, Event::IngredientsParsed(query.clone()));
        assert_eq!(t.next, Node::Ranking);
        assert_eq!(t.effect, Effect::Rank(query));

        let t = step(Node::AwaitingIngredients, Event::NothingParsed);
        assert_eq!(t.next, Node::AwaitingIngredients);
        assert_eq!(t.effect, Effect::RequestIngredients);

        let t = step(Node::Ranking, Event::Ranked { found: false });
        assert_eq!(t.next, Node::NoMatches);

        let t = step(Node::NoMatches, Event::TextReceived);
        assert_eq!(t.next, Node::AwaitingIngredients);

        let t = step(Node::Ranking, Event::Ranked { found: true });
        assert_eq!(t.next, Node::PresentingMatches);
        let t = step(Node::PresentingMatches, Event::Presented);
        assert_eq!(t.next, Node::AwaitingSelection);
        assert!(t.effect.ends_turn());
    }

    #[test]
    fn selection_flow() {
        for node in [Node::AwaitingSelection, Node::PresentingInstructions] {
            let t = step(node, Event::TextReceived);
            assert_eq!(t.next, node);
            assert_eq!(t.effect, Effect::ResolveSelection);

            let t = step(node, Event::SelectionResolved { recipe_id: "r1".into() });
            assert_eq!(t.next, Node::PresentingInstructions);
            assert_eq!(t.effect, Effect::RenderInstructions { recipe_id: "r1".into() });

            let t = step(node, Event::SelectionRejected);
            assert_eq!(t.next, node);
            assert_eq!(t.effect, Effect::RejectSelection);

            let t = step(node, Event::FreshIngredients);
            assert_eq!(t.next, Node::AwaitingIngredients);
            assert_eq!(t.effect, Effect::ExtractIngredients);
        }
    }

    #[test]
    fn unknown_edges_are_rejected() {
        let err = transition(Node::Start, Event::Presented).unwrap_err();
        assert_eq!(err.from, Node::Start);
        assert!(err.to_string().contains("Presented"));

        assert!(transition(Node::Error, Event::TextReceived).is_err());
        assert!(transition(Node::Ranking, Event::TextReceived).is_err());
        assert!(transition(Node::AwaitingIngredients, Event::Classified(Verdict::OnTopic)).is_err());
    }

    #[test]
    fn every_step_follows_a_graph_edge() {
        let events = || {
            vec![
                Event::TextReceived,
                Event::Classified(Verdict::OnTopic),
                Event::Classified(Verdict::OffTopic),
                Event::ClassifierFailed,
                Event::IngredientsParsed(UserQuery::parse("egg")),
                Event::NothingParsed,
                Event::Ranked { found: true },
                Event::Ranked { found: false },
                Event::Presented,
                Event::SelectionResolved { recipe_id: "x".into() },
                Event::SelectionRejected,
                Event::FreshIngredients,
            ]
        };

        for from in Node::ALL {
            for event in events() {
                if let Ok(t) = transition(from, event) {
                    assert!(is_valid_transition(from, t.next), "{from} -> {}", t.next);
                }
            }
        }
    }

    #[test]
    fn instructions_allow_another_selection() {
        use Node::*;
        assert!(is_valid_transition(PresentingInstructions, PresentingInstructions));
        assert!(is_valid_transition(PresentingInstructions, AwaitingIngredients));
        assert!(!is_valid_transition(PresentingInstructions, Ranking));
    }

    #[test]
    fn no_turn_starts_from_transient_nodes() {
        for node in Node::ALL.into_iter().filter(|n| !n.is_resting()) {
            assert!(transition(node, Event::TextReceived).is_err(), "{node}");
        }
    }
}
