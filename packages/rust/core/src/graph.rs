//! Turn driver for the conversation graph.
//!
//! A turn starts from the session's resting node with
//! [`Event::TextReceived`], then alternates between the pure
//! [`transition()`] function and the effect it asks for until an effect
//! produces the reply. All work happens on a draft of the session; the
//! draft replaces the session only when the turn succeeds.

use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use larder_catalog::RecipeCatalog;
use larder_intent::{ClassifierExhausted, IntentClassifier, RetryPolicy, classify_with_retry};
use larder_matcher::{UserQuery, rank_query};
use larder_shared::{AppConfig, DEFAULT_DECLINE_MESSAGE, normalize_ingredient};

use crate::instructions::InstructionRenderer;
use crate::node::Node;
use crate::payload::{ClarificationReason, DisplayPayload, TurnResult};
use crate::session::{SessionState, Speaker};
use crate::transition::{Effect, Event, transition};

/// Upper bound on transitions in one turn. The longest path takes five.
const MAX_STEPS: usize = 8;

/// Behaviour of the conversation.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// How many ranked recipes are presented (0 = all).
    pub max_matches: usize,
    pub decline_message: String,
    pub retry: RetryPolicy,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_matches: 3,
            decline_message: DEFAULT_DECLINE_MESSAGE.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&AppConfig> for GraphConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_matches: config.conversation.max_matches,
            decline_message: config.conversation.decline_message.clone(),
            retry: RetryPolicy::from(&config.classifier),
        }
    }
}

/// Progress callback for front ends that show what a turn is doing.
pub trait TurnProgress: Send + Sync {
    /// Called each time the turn enters a node.
    fn entered(&self, node: Node);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl TurnProgress for SilentProgress {
    fn entered(&self, _node: Node) {}
}

/// What an effect produced.
enum Flow {
    Continue(Event),
    Reply(DisplayPayload),
    Unavailable(ClassifierExhausted),
    Failed(String),
}

/// Sequences classification, ranking and rendering for every session.
///
/// Holds only shared read-only collaborators, so one graph serves any
/// number of sessions.
pub struct ConversationGraph {
    catalog: Arc<RecipeCatalog>,
    classifier: Arc<dyn IntentClassifier>,
    config: GraphConfig,
}

impl ConversationGraph {
    pub fn new(
        catalog: Arc<RecipeCatalog>,
        classifier: Arc<dyn IntentClassifier>,
        config: GraphConfig,
    ) -> Self {
        Self {
            catalog,
            classifier,
            config,
        }
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Run one turn. Never fails: every problem becomes a [`TurnResult`].
    pub async fn submit_turn(&self, session: &mut SessionState, text: &str) -> TurnResult {
        self.submit_turn_with_progress(session, text, &SilentProgress)
            .await
    }

    /// Run one turn, reporting each node entered to `progress`.
    #[instrument(skip_all, fields(session = %session.id, from = %session.node))]
    pub async fn submit_turn_with_progress(
        &self,
        session: &mut SessionState,
        text: &str,
        progress: &dyn TurnProgress,
    ) -> TurnResult {
        let mut draft = session.clone();
        let mut path = vec![draft.node];
        let mut event = Event::TextReceived;
        let mut failure = None;

        for _ in 0..MAX_STEPS {
            let step = match transition(draft.node, event) {
                Ok(step) => step,
                Err(e) => {
                    error!(error = %e, "conversation graph rejected a transition");
                    return Self::failed(session, path, e.to_string());
                }
            };

            debug!(from = %draft.node, to = %step.next, effect = ?step.effect, "transition");
            draft.node = step.next;
            if path.last() != Some(&step.next) {
                path.push(step.next);
            }
            progress.entered(step.next);

            match self.apply(&mut draft, &mut failure, step.effect, text).await {
                Flow::Continue(next) => event = next,
                Flow::Reply(payload) => return Self::commit(session, draft, text, payload, path),
                Flow::Unavailable(exhausted) if !exhausted.transient => {
                    error!(error = %exhausted.last_error, "turn failed: classifier refused the request");
                    let message = format!(
                        "the intent classifier refused the request ({})",
                        exhausted.last_error
                    );
                    return Self::failed(session, path, message);
                }
                Flow::Unavailable(exhausted) => {
                    warn!(
                        attempts = exhausted.attempts,
                        error = %exhausted.last_error,
                        "turn failed: classifier unavailable"
                    );
                    return TurnResult {
                        state: Node::Error,
                        payload: DisplayPayload::Unavailable {
                            message: "The assistant is temporarily unavailable. \
                                      Please try again in a moment."
                                .to_string(),
                            attempts: exhausted.attempts,
                            cause: exhausted.last_error,
                        },
                        available_selections: session.available_selections(),
                        path,
                    };
                }
                Flow::Failed(message) => {
                    error!(%message, "turn failed");
                    return Self::failed(session, path, message);
                }
            }
        }

        error!(steps = MAX_STEPS, "turn did not reach a resting node");
        Self::failed(session, path, "the conversation did not settle".to_string())
    }

    /// Perform one effect on the draft session.
    async fn apply(
        &self,
        draft: &mut SessionState,
        failure: &mut Option<ClassifierExhausted>,
        effect: Effect,
        text: &str,
    ) -> Flow {
        match effect {
            Effect::Classify => {
                match classify_with_retry(self.classifier.as_ref(), text, &self.config.retry).await
                {
                    Ok(verdict) => Flow::Continue(Event::Classified(verdict)),
                    Err(exhausted) => {
                        *failure = Some(exhausted);
                        Flow::Continue(Event::ClassifierFailed)
                    }
                }
            }

            Effect::ReportUnavailable => match failure.take() {
                Some(exhausted) => Flow::Unavailable(exhausted),
                None => Flow::Failed("classifier failure without details".to_string()),
            },

            Effect::Decline => {
                info!("request declined as off-topic");
                Flow::Reply(DisplayPayload::Decline {
                    message: self.config.decline_message.clone(),
                })
            }

            Effect::ExtractIngredients => {
                draft.intent_confirmed = true;
                let query = UserQuery::parse(text);
                if query.is_empty() {
                    Flow::Continue(Event::NothingParsed)
                } else {
                    Flow::Continue(Event::IngredientsParsed(query))
                }
            }

            Effect::RequestIngredients => Flow::Reply(DisplayPayload::Clarification {
                reason: ClarificationReason::EmptyQuery,
                message: "I couldn't spot any ingredients there. Which ingredients do you \
                          have? For example: \"eggs, flour and milk\"."
                    .to_string(),
            }),

            Effect::Rank(query) => match rank_query(&self.catalog, &query) {
                Ok(mut results) => {
                    if self.config.max_matches > 0 {
                        results.truncate(self.config.max_matches);
                    }
                    let found = !results.is_empty();
                    info!(
                        ingredients = query.ingredients().len(),
                        matches = results.len(),
                        "recipes ranked"
                    );
                    draft.last_results = results;
                    draft.last_ingredients = query.ingredients().to_vec();
                    draft.selected = None;
                    Flow::Continue(Event::Ranked { found })
                }
                Err(e) => Flow::Failed(e.to_string()),
            },

            Effect::PresentMatches => Flow::Continue(Event::Presented),

            Effect::AwaitSelection => Flow::Reply(DisplayPayload::Matches {
                ingredients: draft.last_ingredients.clone(),
                matches: draft.last_results.clone(),
            }),

            Effect::RequestOtherIngredients => Flow::Reply(DisplayPayload::Clarification {
                reason: ClarificationReason::NoMatches,
                message: format!(
                    "No recipe uses {}. Try some other ingredients.",
                    draft.last_ingredients.join(", ")
                ),
            }),

            Effect::ResolveSelection => Flow::Continue(self.resolve_selection(draft, text)),

            Effect::RenderInstructions { recipe_id } => match self.catalog.lookup(&recipe_id) {
                Some(recipe) => {
                    info!(recipe = %recipe_id, "presenting instructions");
                    draft.selected = Some(recipe_id.clone());
                    Flow::Reply(DisplayPayload::Instructions {
                        recipe_id,
                        name: recipe.name().to_string(),
                        steps: InstructionRenderer::render(recipe),
                    })
                }
                None => Flow::Failed(format!("recipe '{recipe_id}' not found")),
            },

            Effect::RejectSelection => Flow::Reply(DisplayPayload::Clarification {
                reason: ClarificationReason::RecipeNotFound,
                message: format!(
                    "\"{}\" is not one of the suggested recipes. Reply with {}, \
                     or send a new list of ingredients.",
                    text.trim(),
                    selection_hint(draft)
                ),
            }),
        }
    }

    /// Map a message to a presented recipe, a fresh ingredient list, or a
    /// rejected selection.
    ///
    /// A presented id or a 1-based position always selects. A list naming
    /// two or more known ingredients is a fresh list even when it also
    /// mentions a presented recipe name ("rice and beans" next to a recipe
    /// called "Rice"). Otherwise a mentioned name selects (the longest
    /// mentioned name wins), and any known ingredient restarts matching.
    fn resolve_selection(&self, draft: &SessionState, text: &str) -> Event {
        let presented: Vec<(&str, &str)> = draft
            .last_results
            .iter()
            .map(|m| (m.recipe_id.as_str(), m.name.as_str()))
            .collect();

        if let Some(recipe_id) = select_exact(&presented, text) {
            return self.selected(recipe_id);
        }

        let query = UserQuery::parse(text);
        let known = query
            .ingredients()
            .iter()
            .filter(|i| self.catalog.knows_ingredient(i))
            .count();

        if known < 2 {
            if let Some(recipe_id) = select_by_name(&presented, text) {
                return self.selected(recipe_id);
            }
        }

        if known > 0 {
            debug!(ingredients = ?query.ingredients(), "fresh ingredient list");
            Event::FreshIngredients
        } else {
            Event::SelectionRejected
        }
    }

    fn selected(&self, recipe_id: String) -> Event {
        if self.catalog.lookup(&recipe_id).is_none() {
            warn!(recipe = %recipe_id, "presented recipe missing from catalog");
            return Event::SelectionRejected;
        }
        Event::SelectionResolved { recipe_id }
    }

    /// Replace the session with the finished draft and record the exchange.
    fn commit(
        session: &mut SessionState,
        mut draft: SessionState,
        text: &str,
        payload: DisplayPayload,
        path: Vec<Node>,
    ) -> TurnResult {
        draft.record(Speaker::User, text);
        draft.record(Speaker::Assistant, payload.to_string());
        *session = draft;

        debug!(state = %session.node, path = ?path, "turn complete");
        TurnResult {
            state: session.node,
            available_selections: session.available_selections(),
            payload,
            path,
        }
    }

    fn failed(session: &SessionState, mut path: Vec<Node>, message: String) -> TurnResult {
        if path.last() != Some(&Node::Error) {
            path.push(Node::Error);
        }
        TurnResult {
            state: Node::Error,
            payload: DisplayPayload::Failure {
                message: format!("Sorry, something went wrong: {message}"),
            },
            available_selections: session.available_selections(),
            path,
        }
    }
}

/// A presented id typed on its own, or a 1-based position.
fn select_exact(presented: &[(&str, &str)], text: &str) -> Option<String> {
    let trimmed = text.trim();

    if let Some((id, _)) = presented
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(trimmed))
    {
        return Some(id.to_string());
    }

    let position = trimmed
        .trim_start_matches('#')
        .trim_end_matches(['.', ')', '!'])
        .trim();
    position
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| presented.get(i))
        .map(|(id, _)| id.to_string())
}

/// A presented name (longest first) or id mentioned anywhere in `text`.
fn select_by_name(presented: &[(&str, &str)], text: &str) -> Option<String> {
    let padded = format!(" {} ", normalize_ingredient(text)?);
    let mentions = |label: &str| match normalize_ingredient(label) {
        Some(label) => padded.contains(&format!(" {label} ")),
        None => false,
    };

    let mut best: Option<(&str, &str)> = None;
    for &(id, name) in presented {
        if mentions(name) && best.is_none_or(|(_, current)| name.len() > current.len()) {
            best = Some((id, name));
        }
    }

    best.map(|(id, _)| id)
        .or_else(|| {
            presented
                .iter()
                .find(|(id, _)| mentions(*id))
                .map(|&(id, _)| id)
        })
        .map(str::to_string)
}

fn selection_hint(session: &SessionState) -> String {
    match session.last_results.len() {
        0 => "a recipe from the list".to_string(),
        1 => "1 or the recipe name".to_string(),
        n => format!("a number from 1 to {n}, a recipe id or its name"),
    }
}

#[cfg(test)]
mod tests {
    use larder_catalog::RawRecipe;
    use larder_intent::Verdict;

    use super::*;
    use crate::testing::{
        Outcome, ScriptedClassifier, fixture_catalog, graph_with, test_config,
    };

    fn select(presented: &[(&str, &str)], text: &str) -> Option<String> {
        select_exact(presented, text).or_else(|| select_by_name(presented, text))
    }

    const PRESENTED: [(&str, &str); 3] = [
        ("pancakes", "Pancakes"),
        ("omelette", "Omelette"),
        ("egg-fried-rice", "Egg Fried Rice"),
    ];

    #[test]
    fn selects_by_id_position_or_name() {
        assert_eq!(select(&PRESENTED, " Omelette").as_deref(), Some("omelette"));
        assert_eq!(select(&PRESENTED, "2").as_deref(), Some("omelette"));
        assert_eq!(select(&PRESENTED, "#3.").as_deref(), Some("egg-fried-rice"));
        assert_eq!(
            select(&PRESENTED, "how do I make pancakes?").as_deref(),
            Some("pancakes")
        );
        assert_eq!(
            select(&PRESENTED, "the egg fried rice please").as_deref(),
            Some("egg-fried-rice")
        );
        assert_eq!(
            select(&PRESENTED, "show egg-fried-rice").as_deref(),
            Some("egg-fried-rice")
        );
    }

    #[test]
    fn out_of_range_or_unknown_is_none() {
        let presented = [("pancakes", "Pancakes")];
        assert_eq!(select(&presented, "0"), None);
        assert_eq!(select(&presented, "4"), None);
        assert_eq!(select(&presented, "lasagne"), None);
        assert_eq!(select(&presented, "   "), None);
        assert_eq!(select(&[], "1"), None);
    }

    #[test]
    fn longest_mentioned_name_wins() {
        let presented = [("rice", "Rice"), ("fried-rice", "Fried Rice")];
        assert_eq!(
            select(&presented, "I'd like the fried rice").as_deref(),
            Some("fried-rice")
        );
    }

    fn match_ids(result: &TurnResult) -> Vec<&str> {
        match &result.payload {
            DisplayPayload::Matches { matches, .. } => {
                matches.iter().map(|m| m.recipe_id.as_str()).collect()
            }
            other => panic!("expected matches, got {other:?}"),
        }
    }

    fn clarification(result: &TurnResult) -> ClarificationReason {
        match &result.payload {
            DisplayPayload::Clarification { reason, .. } => *reason,
            other => panic!("expected clarification, got {other:?}"),
        }
    }

    /// Session resting on the egg-and-butter suggestions:
    /// omelette (2/2), pancakes (2/4), carbonara (1/5).
    async fn presented_session(
        graph: &ConversationGraph,
    ) -> (SessionState, TurnResult) {
        let mut session = SessionState::new();
        let result = graph.submit_turn(&mut session, "I have egg and butter").await;
        (session, result)
    }

    #[tokio::test]
    async fn off_topic_request_is_declined() {
        let classifier = ScriptedClassifier::answering(Verdict::OffTopic);
        let graph = graph_with(fixture_catalog(), classifier.clone());
        let mut session = SessionState::new();

        let result = graph.submit_turn(&mut session, "how do I buy stocks").await;

        assert_eq!(result.state, Node::Declined);
        assert_eq!(
            result.payload,
            DisplayPayload::Decline {
                message: DEFAULT_DECLINE_MESSAGE.to_string()
            }
        );
        assert_eq!(result.path, [Node::Start, Node::AwaitingIntentDecision, Node::Declined]);
        assert!(!result.visited(Node::Ranking));
        assert!(result.available_selections.is_empty());
        assert_eq!(classifier.calls(), 1);

        assert_eq!(session.node(), Node::Declined);
        assert!(session.last_results().is_empty());
        assert!(!session.intent_confirmed());
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn declined_session_accepts_a_new_request() {
        let classifier = ScriptedClassifier::scripted(
            [Outcome::Answer(Verdict::OffTopic)],
            Verdict::OnTopic,
        );
        let graph = graph_with(fixture_catalog(), classifier.clone());
        let mut session = SessionState::new();

        graph.submit_turn(&mut session, "tell me a joke").await;
        let result = graph.submit_turn(&mut session, "beef and tomato").await;

        assert_eq!(result.state, Node::AwaitingSelection);
        assert_eq!(result.path[0], Node::Declined);
        assert_eq!(match_ids(&result), ["beef-tacos"]);
        assert_eq!(classifier.calls(), 2);
    }

    #[tokio::test]
    async fn exhausted_classifier_leaves_session_unchanged() {
        let classifier = ScriptedClassifier::scripted(
            [Outcome::Unavailable; 3],
            Verdict::OnTopic,
        );
        let graph = graph_with(fixture_catalog(), classifier.clone());
        let mut session = SessionState::new();

        let result = graph.submit_turn(&mut session, "I have egg and butter").await;

        assert!(result.is_error());
        assert!(result.is_retryable());
        match &result.payload {
            DisplayPayload::Unavailable { attempts, cause, .. } => {
                assert_eq!(*attempts, 3);
                assert!(cause.contains("model overloaded"));
            }
            other => panic!("expected unavailability, got {other:?}"),
        }
        assert_eq!(result.path.last(), Some(&Node::Error));
        assert_eq!(classifier.calls(), 3);

        assert_eq!(session.node(), Node::Start);
        assert!(session.history().is_empty());
        assert!(!session.intent_confirmed());

        // Resubmitting the same turn classifies again from scratch.
        let result = graph.submit_turn(&mut session, "I have egg and butter").await;
        assert_eq!(result.state, Node::AwaitingSelection);
        assert_eq!(classifier.calls(), 4);
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn refused_classifier_is_a_failure_not_unavailability() {
        let classifier = ScriptedClassifier::scripted([Outcome::Refused; 3], Verdict::OnTopic);
        let graph = graph_with(fixture_catalog(), classifier.clone());
        let mut session = SessionState::new();

        let result = graph.submit_turn(&mut session, "egg and butter").await;

        assert!(result.is_error());
        assert!(!result.is_retryable());
        match &result.payload {
            DisplayPayload::Failure { message } => assert!(message.contains("HTTP 401")),
            other => panic!("expected a failure, got {other:?}"),
        }
        assert_eq!(result.path.last(), Some(&Node::Error));
        assert_eq!(classifier.calls(), 1);
        assert_eq!(session.node(), Node::Start);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn classifier_recovering_within_bound_succeeds() {
        let classifier = ScriptedClassifier::scripted(
            [Outcome::Unavailable, Outcome::Unavailable],
            Verdict::OnTopic,
        );
        let graph = graph_with(fixture_catalog(), classifier.clone());
        let (_, result) = presented_session(&graph).await;

        assert_eq!(result.state, Node::AwaitingSelection);
        assert_eq!(classifier.calls(), 3);
    }

    #[tokio::test]
    async fn matches_are_ranked_and_presented() {
        let record = |id: &str, ingredients: &[&str]| RawRecipe {
            id: Some(id.into()),
            name: Some(id.to_uppercase()),
            ingredients: Some(ingredients.iter().map(|s| s.to_string()).collect()),
            instructions: Some(vec!["Mix.".into()]),
            ..Default::default()
        };
        let catalog = RecipeCatalog::load(vec![
            record("r2", &["egg", "milk", "flour"]),
            record("r1", &["egg", "flour"]),
        ])
        .unwrap();
        let graph = graph_with(Arc::new(catalog), ScriptedClassifier::answering(Verdict::OnTopic));
        let mut session = SessionState::new();

        let result = graph.submit_turn(&mut session, "egg, flour").await;

        assert_eq!(
            result.path,
            [
                Node::Start,
                Node::AwaitingIntentDecision,
                Node::AwaitingIngredients,
                Node::Ranking,
                Node::PresentingMatches,
                Node::AwaitingSelection,
            ]
        );
        assert_eq!(match_ids(&result), ["r1", "r2"]);
        assert_eq!(result.available_selections, ["r1", "r2"]);
        assert!(session.intent_confirmed());
        assert_eq!(session.last_ingredients(), ["egg", "flour"]);
    }

    #[tokio::test]
    async fn selection_renders_exact_instructions() {
        let classifier = ScriptedClassifier::answering(Verdict::OnTopic);
        let catalog = fixture_catalog();
        let graph = graph_with(catalog.clone(), classifier.clone());
        let (mut session, presented) = presented_session(&graph).await;
        assert_eq!(match_ids(&presented), ["omelette", "pancakes", "carbonara"]);

        for id in presented.available_selections.clone() {
            let result = graph.submit_turn(&mut session, &id).await;
            assert_eq!(result.state, Node::PresentingInstructions);
            match &result.payload {
                DisplayPayload::Instructions { recipe_id, steps, .. } => {
                    assert_eq!(recipe_id, &id);
                    assert_eq!(steps.as_slice(), catalog.lookup(&id).unwrap().instructions());
                }
                other => panic!("expected instructions, got {other:?}"),
            }
            assert_eq!(session.selected(), Some(id.as_str()));
            assert_eq!(result.available_selections, presented.available_selections);
        }

        // intent is only checked once per session
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn selection_by_position_or_name() {
        let graph = graph_with(fixture_catalog(), ScriptedClassifier::answering(Verdict::OnTopic));
        let (mut session, _) = presented_session(&graph).await;

        let result = graph.submit_turn(&mut session, "2").await;
        assert_eq!(session.selected(), Some("pancakes"));
        assert_eq!(result.state, Node::PresentingInstructions);

        let result = graph
            .submit_turn(&mut session, "how do I make the spaghetti carbonara?")
            .await;
        assert_eq!(result.state, Node::PresentingInstructions);
        assert_eq!(session.selected(), Some("carbonara"));
    }

    #[tokio::test]
    async fn empty_query_asks_for_ingredients() {
        let classifier = ScriptedClassifier::answering(Verdict::OnTopic);
        let graph = graph_with(fixture_catalog(), classifier.clone());
        let mut session = SessionState::new();

        let result = graph.submit_turn(&mut session, "please find me a recipe").await;
        assert_eq!(result.state, Node::AwaitingIngredients);
        assert_eq!(clarification(&result), ClarificationReason::EmptyQuery);
        assert!(!result.visited(Node::Ranking));
        assert!(session.intent_confirmed());

        let result = graph.submit_turn(&mut session, "beef").await;
        assert_eq!(result.state, Node::AwaitingSelection);
        assert_eq!(match_ids(&result), ["beef-tacos"]);
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn no_matches_reprompts() {
        let graph = graph_with(fixture_catalog(), ScriptedClassifier::answering(Verdict::OnTopic));
        let mut session = SessionState::new();

        let result = graph.submit_turn(&mut session, "chocolate and marshmallows").await;
        assert_eq!(result.state, Node::NoMatches);
        assert_eq!(clarification(&result), ClarificationReason::NoMatches);
        assert!(result.available_selections.is_empty());
        assert!(session.last_results().is_empty());

        let result = graph.submit_turn(&mut session, "onion, carrot").await;
        assert_eq!(result.state, Node::AwaitingSelection);
        assert_eq!(match_ids(&result), ["lentil-soup", "beef-tacos"]);
    }

    #[tokio::test]
    async fn unknown_selection_is_rejected_without_state_change() {
        let graph = graph_with(fixture_catalog(), ScriptedClassifier::answering(Verdict::OnTopic));
        let (mut session, presented) = presented_session(&graph).await;

        for text in ["lasagne", "7", "beef-tacos"] {
            let result = graph.submit_turn(&mut session, text).await;
            assert_eq!(result.state, Node::AwaitingSelection, "{text}");
            assert_eq!(clarification(&result), ClarificationReason::RecipeNotFound);
            assert_eq!(result.available_selections, presented.available_selections);
            assert_eq!(session.node(), Node::AwaitingSelection);
            assert!(session.selected().is_none());
        }
    }

    #[tokio::test]
    async fn fresh_ingredients_restart_matching() {
        let classifier = ScriptedClassifier::answering(Verdict::OnTopic);
        let graph = graph_with(fixture_catalog(), classifier.clone());
        let (mut session, _) = presented_session(&graph).await;
        graph.submit_turn(&mut session, "1").await;
        assert_eq!(session.node(), Node::PresentingInstructions);

        let result = graph.submit_turn(&mut session, "I have onion and carrot").await;

        assert_eq!(
            result.path,
            [
                Node::PresentingInstructions,
                Node::AwaitingIngredients,
                Node::Ranking,
                Node::PresentingMatches,
                Node::AwaitingSelection,
            ]
        );
        assert_eq!(match_ids(&result), ["lentil-soup", "beef-tacos"]);
        assert!(session.selected().is_none());
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn ingredient_list_wins_over_recipe_named_like_an_ingredient() {
        let record = |id: &str, name: &str, ingredients: &[&str]| RawRecipe {
            id: Some(id.into()),
            name: Some(name.into()),
            ingredients: Some(ingredients.iter().map(|s| s.to_string()).collect()),
            instructions: Some(vec!["Cook.".into()]),
            ..Default::default()
        };
        let catalog = RecipeCatalog::load(vec![
            record("rice", "Rice", &["rice", "water"]),
            record("chili", "Bean Chili", &["beans", "tomato"]),
        ])
        .unwrap();
        let graph = graph_with(Arc::new(catalog), ScriptedClassifier::answering(Verdict::OnTopic));
        let mut session = SessionState::new();

        let result = graph.submit_turn(&mut session, "rice, water").await;
        assert_eq!(match_ids(&result), ["rice"]);

        let result = graph.submit_turn(&mut session, "rice and beans").await;
        assert!(result.visited(Node::Ranking));
        assert_eq!(result.state, Node::AwaitingSelection);
        assert_eq!(match_ids(&result), ["chili", "rice"]);
        assert!(session.selected().is_none());

        let result = graph.submit_turn(&mut session, "the rice please").await;
        assert_eq!(result.state, Node::PresentingInstructions);
        assert_eq!(session.selected(), Some("rice"));
    }

    #[tokio::test]
    async fn plural_ingredients_find_singular_recipes() {
        let graph = graph_with(fixture_catalog(), ScriptedClassifier::answering(Verdict::OnTopic));
        let mut session = SessionState::new();

        let result = graph.submit_turn(&mut session, "I have eggs").await;

        assert_eq!(result.state, Node::AwaitingSelection);
        assert_eq!(match_ids(&result), ["omelette", "pancakes", "carbonara"]);
    }

    #[tokio::test]
    async fn preferences_filter_the_suggestions() {
        let graph = graph_with(fixture_catalog(), ScriptedClassifier::answering(Verdict::OnTopic));
        let mut session = SessionState::new();

        let result = graph
            .submit_turn(&mut session, "egg and butter, under 15 minutes")
            .await;
        assert_eq!(match_ids(&result), ["omelette"]);

        let result = graph.submit_turn(&mut session, "onion, vegan").await;
        assert_eq!(match_ids(&result), ["lentil-soup"]);
    }

    #[tokio::test]
    async fn presented_list_is_limited() {
        let config = GraphConfig {
            max_matches: 1,
            ..test_config()
        };
        let graph = ConversationGraph::new(
            fixture_catalog(),
            ScriptedClassifier::answering(Verdict::OnTopic),
            config,
        );
        let (mut session, result) = presented_session(&graph).await;
        assert_eq!(match_ids(&result), ["omelette"]);

        let result = graph.submit_turn(&mut session, "2").await;
        assert_eq!(clarification(&result), ClarificationReason::RecipeNotFound);

        let result = graph.submit_turn(&mut session, "pancakes").await;
        assert_eq!(clarification(&result), ClarificationReason::RecipeNotFound);
    }

    #[tokio::test]
    async fn history_records_every_completed_turn() {
        let graph = graph_with(fixture_catalog(), ScriptedClassifier::answering(Verdict::OnTopic));
        let (mut session, _) = presented_session(&graph).await;
        graph.submit_turn(&mut session, "omelette").await;

        let history = session.history();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].speaker, Speaker::User);
        assert_eq!(history[0].text, "I have egg and butter");
        assert_eq!(history[1].speaker, Speaker::Assistant);
        assert!(history[1].text.contains("French Omelette"));
        assert!(history[3].text.starts_with("French Omelette"));
    }
}
