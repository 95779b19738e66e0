//! Free-text query parsing: ingredient extraction and preference detection.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use larder_catalog::Recipe;
use larder_shared::{Diet, normalize_ingredient};

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches a time cap such as `30 min`, `under 45 minutes`, `1 hour`.
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(?:under|within|in|less than|max(?:imum)?|at most|up to)\s+)?(\d{1,4})\s*-?\s*(mins?|minutes?|hours?|hrs?)\b",
    )
    .expect("time regex")
});

/// Matches dietary restriction words.
static DIET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(vegan|vegetarian|gluten[\s-]?free)\b").expect("diet regex")
});

/// Conversational filler that separates ingredient names.
static FILLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:i have|i['’]ve got|i got|i want|i['’]d like|i would like|i need|what can i (?:make|cook)|can i (?:make|cook)|give me|suggest|show me|looking for|something|anything|using|with|and|or|plus|some|please|find|recipes?|ideas?|dish(?:es)?|meals?|cook|make|for|me|a|an|the|of|to|only|got|have|want|any|i)\b",
    )
    .expect("filler regex")
});

/// Characters that separate list items.
static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;.!?\n/&+:]+").expect("separator regex"));

/// Fragments that survive filler removal but are never ingredients.
const STOP_WORDS: &[&str] = &[
    "min", "mins", "minute", "minutes", "hour", "hours", "hr", "hrs", "time", "quick", "easy",
    "dinner", "lunch", "breakfast", "tonight", "today", "hi", "hello", "hey", "thanks",
];

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Filters detected alongside the ingredients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preferences {
    /// Upper bound on cooking time in minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_minutes: Option<u32>,
    /// Accepted dietary tags; a recipe needs at least one of them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dietary: Vec<Diet>,
}

impl Preferences {
    /// Detect a time cap and dietary restrictions in free text.
    pub fn parse(text: &str) -> Self {
        let max_minutes = TIME_RE.captures(text).and_then(|caps| {
            let amount: u32 = caps[1].parse().ok()?;
            let unit = caps[2].to_lowercase();
            if unit.starts_with('h') {
                amount.checked_mul(60)
            } else {
                Some(amount)
            }
        });

        let mut dietary: Vec<Diet> = DIET_RE
            .find_iter(text)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        dietary.sort();
        dietary.dedup();

        Self {
            max_minutes,
            dietary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.max_minutes.is_none() && self.dietary.is_empty()
    }

    /// Whether the recipe passes these filters.
    ///
    /// With a time cap, recipes without a stated time are excluded. Without
    /// one, no default cap applies.
    pub fn admits(&self, recipe: &Recipe) -> bool {
        if let Some(max) = self.max_minutes {
            match recipe.cooking_time() {
                Some(t) if t <= max => {}
                _ => return false,
            }
        }

        self.dietary.is_empty() || self.dietary.iter().any(|d| recipe.suits(*d))
    }
}

// ---------------------------------------------------------------------------
// UserQuery
// ---------------------------------------------------------------------------

/// A user's request: raw text, normalized ingredient names and preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserQuery {
    raw: String,
    /// Normalized, deduplicated, in order of first mention.
    ingredients: Vec<String>,
    preferences: Preferences,
}

impl UserQuery {
    /// Parse free text such as `"I have eggs, flour and milk, 30 min"`.
    pub fn parse(text: &str) -> Self {
        let preferences = Preferences::parse(text);
        let ingredients = extract_ingredients(text);

        Self {
            raw: text.to_string(),
            ingredients,
            preferences,
        }
    }

    /// Build a query from an explicit ingredient list.
    pub fn from_ingredients<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let raw: Vec<String> = items.into_iter().map(|s| s.as_ref().to_string()).collect();
        let mut seen = HashSet::new();
        let ingredients = raw
            .iter()
            .filter_map(|s| normalize_ingredient(s))
            .filter(|s| seen.insert(s.clone()))
            .collect();

        Self {
            raw: raw.join(", "),
            ingredients,
            preferences: Preferences::default(),
        }
    }

    /// Replace the detected preferences.
    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn ingredients(&self) -> &[String] {
        &self.ingredients
    }

    pub fn ingredient_set(&self) -> BTreeSet<String> {
        self.ingredients.iter().cloned().collect()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// True when no ingredient could be read.
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }
}

/// Pull ingredient names out of conversational text.
fn extract_ingredients(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stripped = TIME_RE.replace_all(&lowered, ",");
    let stripped = DIET_RE.replace_all(&stripped, ",");
    let stripped = FILLER_RE.replace_all(&stripped, ",");

    let mut seen = HashSet::new();
    SEPARATOR_RE
        .split(&stripped)
        .filter_map(normalize_ingredient)
        .filter(|item| !item.chars().all(|c| c.is_ascii_digit() || c == ' '))
        .filter(|item| !STOP_WORDS.contains(&item.as_str()))
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
