//! Ingredient-overlap ranking.
//!
//! Every recipe is scored by how many query ingredients it uses. Recipes
//! sharing nothing with the query are dropped. The rest are ordered by
//! overlap ratio (overlap / recipe ingredient count), then overlap count,
//! then name, then id, so the order is total and independent of load order.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, instrument};

use larder_catalog::{Recipe, RecipeCatalog};
use larder_shared::{LarderError, Result, normalize_ingredient};

use crate::query::{Preferences, UserQuery};

/// Score of one recipe against a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub recipe_id: String,
    pub name: String,
    /// Query ingredients present in the recipe.
    pub overlap: usize,
    /// Distinct ingredients the recipe requires.
    pub ingredient_count: usize,
    /// `overlap / ingredient_count`.
    pub ratio: f64,
    pub matched: BTreeSet<String>,
    /// Recipe ingredients the query did not mention.
    pub missing: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_time: Option<u32>,
}

/// Rank the whole catalog against a set of ingredient names.
///
/// Fails with [`LarderError::EmptyQuery`] when no usable name is given.
pub fn rank(catalog: &RecipeCatalog, ingredients: &BTreeSet<String>) -> Result<Vec<MatchResult>> {
    rank_filtered(catalog, ingredients, &Preferences::default())
}

/// Rank using a parsed query, applying its preferences as filters.
pub fn rank_query(catalog: &RecipeCatalog, query: &UserQuery) -> Result<Vec<MatchResult>> {
    rank_filtered(catalog, &query.ingredient_set(), query.preferences())
}

/// Rank the recipes admitted by `preferences`.
#[instrument(skip_all, fields(query = ingredients.len(), recipes = catalog.len()))]
pub fn rank_filtered(
    catalog: &RecipeCatalog,
    ingredients: &BTreeSet<String>,
    preferences: &Preferences,
) -> Result<Vec<MatchResult>> {
    let query: BTreeSet<String> = ingredients
        .iter()
        .filter_map(|s| normalize_ingredient(s))
        .map(|name| match catalog.canonical_ingredient(&name) {
            Some(known) => known.to_string(),
            None => name,
        })
        .collect();

    if query.is_empty() {
        return Err(LarderError::EmptyQuery);
    }

    let mut results: Vec<MatchResult> = catalog
        .all()
        .filter(|recipe| preferences.admits(recipe))
        .filter_map(|recipe| score(recipe, &query))
        .collect();

    results.sort_by(compare);

    debug!(matches = results.len(), "ranking complete");
    Ok(results)
}

/// Score one recipe. `None` when it shares no ingredient with the query.
pub fn score(recipe: &Recipe, query: &BTreeSet<String>) -> Option<MatchResult> {
    let required = recipe.ingredient_set();
    let matched: BTreeSet<String> = required.intersection(query).cloned().collect();
    if matched.is_empty() {
        return None;
    }

    let missing = required.difference(query).cloned().collect();
    let overlap = matched.len();
    let ingredient_count = required.len();

    Some(MatchResult {
        recipe_id: recipe.id().to_string(),
        name: recipe.name().to_string(),
        overlap,
        ingredient_count,
        ratio: overlap as f64 / ingredient_count as f64,
        matched,
        missing,
        cuisine: recipe.cuisine().map(str::to_string),
        cooking_time: recipe.cooking_time(),
    })
}

/// Ordering used by [`rank`]: best match first.
///
/// Ratios are compared by cross-multiplication so equal fractions
/// (1/2 and 2/4) tie exactly.
pub fn compare(a: &MatchResult, b: &MatchResult) -> Ordering {
    let a_ratio = a.overlap as u64 * b.ingredient_count as u64;
    let b_ratio = b.overlap as u64 * a.ingredient_count as u64;

    b_ratio
        .cmp(&a_ratio)
        .then_with(|| b.overlap.cmp(&a.overlap))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.recipe_id.cmp(&b.recipe_id))
}
