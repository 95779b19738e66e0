//! Recipe records: the decoded input shape and the validated, immutable form.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use larder_shared::{Diet, ParseError, normalize_ingredient};

// ---------------------------------------------------------------------------
// RawRecipe
// ---------------------------------------------------------------------------

/// A decoded but unvalidated recipe record, as supplied by the document layer.
///
/// Every field is optional here so that a missing field is reported as
/// [`ParseError::MalformedRecipe`] instead of a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecipe {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default, alias = "steps")]
    pub instructions: Option<Vec<String>>,
    #[serde(default)]
    pub cuisine: Option<String>,
    /// Total cooking time in minutes.
    #[serde(default, alias = "time")]
    pub cooking_time: Option<u32>,
    #[serde(default)]
    pub dietary: Vec<String>,
}

// ---------------------------------------------------------------------------
// Recipe
// ---------------------------------------------------------------------------

/// A validated recipe. Immutable after catalog load.
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    id: String,
    name: String,
    /// Ingredient names as written in the document (trimmed).
    ingredients: Vec<String>,
    /// Normalized ingredient names used for matching.
    #[serde(skip)]
    ingredient_set: BTreeSet<String>,
    instructions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cuisine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cooking_time: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dietary: Vec<String>,
}

impl Recipe {
    /// Validate a raw record found at position `index` of the input.
    pub fn from_raw(index: usize, raw: RawRecipe) -> Result<Self, ParseError> {
        let id = required_text(index, "id", raw.id)?;
        let name = required_text(index, "name", raw.name)?;

        let raw_ingredients = raw
            .ingredients
            .filter(|list| !list.is_empty())
            .ok_or_else(|| ParseError::malformed(index, "ingredient list is missing or empty"))?;

        let mut ingredients = Vec::with_capacity(raw_ingredients.len());
        let mut ingredient_set = BTreeSet::new();
        for (pos, item) in raw_ingredients.into_iter().enumerate() {
            let normalized = normalize_ingredient(&item).ok_or_else(|| {
                ParseError::malformed(index, format!("ingredient {} is blank", pos + 1))
            })?;
            ingredient_set.insert(normalized);
            ingredients.push(item.trim().to_string());
        }

        let raw_steps = raw
            .instructions
            .filter(|list| !list.is_empty())
            .ok_or_else(|| ParseError::malformed(index, "instruction list is missing or empty"))?;

        let mut instructions = Vec::with_capacity(raw_steps.len());
        for (pos, step) in raw_steps.into_iter().enumerate() {
            let step = step.trim();
            if step.is_empty() {
                return Err(ParseError::malformed(
                    index,
                    format!("instruction step {} is blank", pos + 1),
                ));
            }
            instructions.push(step.to_string());
        }

        let cuisine = raw
            .cuisine
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let dietary = raw
            .dietary
            .iter()
            .filter_map(|tag| match tag.parse::<Diet>() {
                Ok(diet) => Some(diet.as_str().to_string()),
                Err(_) => normalize_ingredient(tag),
            })
            .collect();

        Ok(Self {
            id,
            name,
            ingredients,
            ingredient_set,
            instructions,
            cuisine,
            cooking_time: raw.cooking_time,
            dietary,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ingredient names in document order.
    pub fn ingredients(&self) -> &[String] {
        &self.ingredients
    }

    /// Normalized ingredient names (set semantics).
    pub fn ingredient_set(&self) -> &BTreeSet<String> {
        &self.ingredient_set
    }

    /// Instruction steps in cooking order.
    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    pub fn cuisine(&self) -> Option<&str> {
        self.cuisine.as_deref()
    }

    /// Cooking time in minutes, if the document states one.
    pub fn cooking_time(&self) -> Option<u32> {
        self.cooking_time
    }

    /// Normalized dietary tags (e.g. `vegan`, `gluten-free`).
    pub fn dietary(&self) -> &[String] {
        &self.dietary
    }

    /// Whether the recipe is tagged with the given restriction.
    pub fn suits(&self, diet: Diet) -> bool {
        self.dietary.iter().any(|tag| tag == diet.as_str())
    }
}

fn required_text(index: usize, field: &str, value: Option<String>) -> Result<String, ParseError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ParseError::malformed(index, format!("missing {field}")))
}
