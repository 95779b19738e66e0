//! In-memory recipe catalog for larder.
//!
//! The catalog is built once per process from decoded records, validated,
//! indexed by identifier, and read-only afterwards. Because it is never
//! mutated it can be shared (`Arc<RecipeCatalog>`) across sessions.

pub mod document;
mod recipe;

use std::collections::{BTreeSet, HashMap};

use tracing::{info, instrument, warn};

use larder_shared::{ParseError, ingredient_spellings};

pub use document::{decode_records, load_catalog};
pub use recipe::{RawRecipe, Recipe};

/// Iterator over catalog recipes in load order.
pub type Recipes<'a> = std::slice::Iter<'a, Recipe>;

/// Validated, indexed recipe collection.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
    index: HashMap<String, usize>,
    vocabulary: BTreeSet<String>,
}

impl RecipeCatalog {
    /// Validate and index decoded records.
    ///
    /// Fails on the first record that is missing an id, a name, a non-empty
    /// ingredient list or a non-empty instruction list, and on the first
    /// identifier seen twice. No partial catalog is ever returned.
    #[instrument(skip_all, fields(records = records.len()))]
    pub fn load(records: Vec<RawRecipe>) -> Result<Self, ParseError> {
        let mut catalog = Self {
            recipes: Vec::with_capacity(records.len()),
            ..Self::default()
        };

        for (index, raw) in records.into_iter().enumerate() {
            let recipe = Recipe::from_raw(index, raw)?;

            if catalog.index.contains_key(recipe.id()) {
                return Err(ParseError::DuplicateRecipe {
                    id: recipe.id().to_string(),
                });
            }

            catalog
                .vocabulary
                .extend(recipe.ingredient_set().iter().cloned());
            catalog
                .index
                .insert(recipe.id().to_string(), catalog.recipes.len());
            catalog.recipes.push(recipe);
        }

        if catalog.recipes.is_empty() {
            warn!("recipe catalog is empty");
        }

        info!(
            recipes = catalog.recipes.len(),
            ingredients = catalog.vocabulary.len(),
            "recipe catalog loaded"
        );

        Ok(catalog)
    }

    /// Build from untyped JSON records. A record whose fields have the wrong
    /// type is reported as malformed at its index.
    pub fn from_values(values: Vec<serde_json::Value>) -> Result<Self, ParseError> {
        let records = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value::<RawRecipe>(value)
                    .map_err(|e| ParseError::malformed(index, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::load(records)
    }

    /// Look up a recipe by its exact identifier.
    pub fn lookup(&self, id: &str) -> Option<&Recipe> {
        self.index.get(id).map(|&i| &self.recipes[i])
    }

    /// All recipes in load order. Call again to restart.
    pub fn all(&self) -> Recipes<'_> {
        self.recipes.iter()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Every normalized ingredient name used by at least one recipe.
    pub fn vocabulary(&self) -> &BTreeSet<String> {
        &self.vocabulary
    }

    /// The catalog's spelling of a (normalized) ingredient, accepting simple
    /// singular/plural differences. Exact spellings win.
    pub fn canonical_ingredient(&self, ingredient: &str) -> Option<&str> {
        ingredient_spellings(ingredient)
            .iter()
            .find_map(|form| self.vocabulary.get(form))
            .map(String::as_str)
    }

    /// Whether any recipe uses this (normalized) ingredient, in any simple
    /// spelling.
    pub fn knows_ingredient(&self, ingredient: &str) -> bool {
        self.canonical_ingredient(ingredient).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, name: &str, ingredients: &[&str]) -> RawRecipe {
        RawRecipe {
            id: Some(id.into()),
            name: Some(name.into()),
            ingredients: Some(ingredients.iter().map(|s| s.to_string()).collect()),
            instructions: Some(vec![format!("Make {name}.")]),
            ..Default::default()
        }
    }

    #[test]
    fn plural_spellings_resolve_to_catalog_names() {
        let catalog = RecipeCatalog::load(vec![
            record("r1", "Omelette", &["egg", "tomatoes"]),
            record("r2", "Toast", &["egg", "bread"]),
        ])
        .expect("load");

        assert_eq!(catalog.canonical_ingredient("eggs"), Some("egg"));
        assert_eq!(catalog.canonical_ingredient("egg"), Some("egg"));
        assert_eq!(catalog.canonical_ingredient("tomato"), Some("tomatoes"));
        assert!(catalog.knows_ingredient("breads"));
        assert_eq!(catalog.canonical_ingredient("rice"), None);
    }

    #[test]
    fn load_indexes_in_order() {
        let catalog = RecipeCatalog::load(vec![
            record("r2", "Crepes", &["egg", "milk", "flour"]),
            record("r1", "Scones", &["flour", "butter"]),
        ])
        .expect("load");

        assert_eq!(catalog.len(), 2);
        let ids: Vec<_> = catalog.all().map(|r| r.id()).collect();
        assert_eq!(ids, ["r2", "r1"]);
        // restartable
        assert_eq!(catalog.all().count(), 2);
        assert_eq!(catalog.lookup("r1").unwrap().name(), "Scones");
        assert!(catalog.lookup("r3").is_none());
        assert!(catalog.knows_ingredient("butter"));
        assert!(!catalog.knows_ingredient("beef"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = RecipeCatalog::load(vec![
            record("r1", "A", &["egg"]),
            record("r1", "B", &["milk"]),
        ])
        .unwrap_err();
        assert_eq!(err, ParseError::DuplicateRecipe { id: "r1".into() });
    }

    #[test]
    fn malformed_record_aborts_load() {
        let mut bad = record("r2", "B", &["milk"]);
        bad.ingredients = None;
        let err = RecipeCatalog::load(vec![record("r1", "A", &["egg"]), bad]).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRecipe { index: 1, .. }));
    }

    #[test]
    fn from_values_reports_type_errors_by_index() {
        let values = vec![
            serde_json::json!({"id": "a", "name": "A", "ingredients": ["x"], "instructions": ["y"]}),
            serde_json::json!({"id": "b", "name": "B", "ingredients": "x", "instructions": ["y"]}),
        ];
        let err = RecipeCatalog::from_values(values).unwrap_err();
        assert!(matches!(err, ParseError::MalformedRecipe { index: 1, .. }));
    }
}
