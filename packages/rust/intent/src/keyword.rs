//! Offline keyword classifier.
//!
//! A message is on-topic when it mentions a cooking word or an ingredient
//! known to the catalog. Useful without network access and in tests.

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::debug;

use larder_shared::{Result, ingredient_spellings, normalize_ingredient};

use crate::{IntentClassifier, Verdict};

/// Words that mark a message as food-related regardless of the catalog.
const FOOD_LEXICON: &[&str] = &[
    "cook", "cooking", "recipe", "recipes", "dish", "dishes", "meal", "meals", "bake", "baking",
    "fry", "roast", "grill", "boil", "simmer", "dinner", "lunch", "breakfast", "brunch", "snack",
    "dessert", "ingredient", "ingredients", "hungry", "eat", "food", "kitchen", "vegan",
    "vegetarian", "gluten", "egg", "eggs", "flour", "milk", "butter", "cheese", "pasta", "rice",
    "bread", "chicken", "beef", "pork", "fish", "tofu", "tomato", "tomatoes", "onion", "onions",
    "garlic", "potato", "potatoes", "soup", "salad", "sugar",
];

/// Heuristic classifier over a fixed lexicon plus catalog ingredients.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    vocabulary: BTreeSet<String>,
}

impl KeywordClassifier {
    /// Classifier using only the built-in lexicon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifier that also recognizes the given ingredient names
    /// (typically the catalog vocabulary).
    pub fn with_vocabulary<I, S>(ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            vocabulary: ingredients
                .into_iter()
                .filter_map(|s| normalize_ingredient(s.as_ref()))
                .collect(),
        }
    }

    fn is_food_related(&self, text: &str) -> bool {
        let Some(normalized) = normalize_ingredient(text) else {
            return false;
        };
        let padded = format!(" {normalized} ");

        FOOD_LEXICON
            .iter()
            .copied()
            .chain(self.vocabulary.iter().map(String::as_str))
            .any(|term| mentions(&padded, term))
    }
}

/// Whole-word match of `term` (or a simple plural spelling) in
/// space-padded text.
fn mentions(padded: &str, term: &str) -> bool {
    ingredient_spellings(term)
        .iter()
        .any(|form| padded.contains(&format!(" {form} ")))
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(&self, text: &str) -> Result<Verdict> {
        let verdict = if self.is_food_related(text) {
            Verdict::OnTopic
        } else {
            Verdict::OffTopic
        };
        debug!(%verdict, "keyword classification");
        Ok(verdict)
    }
}
