//! Core domain types shared across larder crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for conversation session identifiers (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new time-sortable session identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Diet
// ---------------------------------------------------------------------------

/// Dietary restriction a user can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Diet {
    Vegan,
    Vegetarian,
    GlutenFree,
}

impl Diet {
    /// All known restrictions, in display order.
    pub const ALL: [Diet; 3] = [Diet::Vegan, Diet::Vegetarian, Diet::GlutenFree];

    /// Tag as it appears in recipe `dietary` lists.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vegan => "vegan",
            Self::Vegetarian => "vegetarian",
            Self::GlutenFree => "gluten-free",
        }
    }
}

impl fmt::Display for Diet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Diet {
    type Err = DietParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vegan" => Ok(Self::Vegan),
            "vegetarian" => Ok(Self::Vegetarian),
            "gluten-free" | "gluten free" | "glutenfree" => Ok(Self::GlutenFree),
            other => Err(DietParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an unknown [`Diet`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown dietary restriction: {0:?}")]
pub struct DietParseError(pub String);

// ---------------------------------------------------------------------------
// Ingredient normalization
// ---------------------------------------------------------------------------

/// Normalize an ingredient name for set comparison.
///
/// Lowercases, turns punctuation into spaces (hyphens and apostrophes are
/// kept), collapses whitespace and trims. Returns `None` when nothing is left.
pub fn normalize_ingredient(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();

    let joined = cleaned
        .split_whitespace()
        .map(|w| w.trim_matches(|c| c == '-' || c == '\''))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if joined.is_empty() { None } else { Some(joined) }
}

/// `name` followed by its simple singular and plural spellings, so "eggs"
/// meets "egg" and "tomato" meets "tomatoes". Only trailing `s`/`es` is
/// considered.
pub fn ingredient_spellings(name: &str) -> Vec<String> {
    let mut forms = vec![name.to_string(), format!("{name}s"), format!("{name}es")];
    forms.extend(name.strip_suffix("es").map(str::to_string));
    forms.extend(name.strip_suffix('s').map(str::to_string));
    forms.retain(|form| !form.is_empty());
    forms.dedup();
    forms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_roundtrip() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().expect("parse SessionId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn diet_parsing() {
        assert_eq!("Vegan".parse::<Diet>().unwrap(), Diet::Vegan);
        assert_eq!("gluten free".parse::<Diet>().unwrap(), Diet::GlutenFree);
        assert!("keto".parse::<Diet>().is_err());
        assert_eq!(Diet::GlutenFree.to_string(), "gluten-free");
    }

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_ingredient("  Olive   Oil. "), Some("olive oil".into()));
        assert_eq!(normalize_ingredient("EGG"), Some("egg".into()));
        assert_eq!(normalize_ingredient("sun-dried tomatoes!"), Some("sun-dried tomatoes".into()));
        assert_eq!(normalize_ingredient("--"), None);
        assert_eq!(normalize_ingredient("   "), None);
    }

    #[test]
    fn spellings_cover_simple_plurals() {
        assert_eq!(ingredient_spellings("egg"), ["egg", "eggs", "egges"]);
        assert!(ingredient_spellings("eggs").contains(&"egg".to_string()));
        assert!(ingredient_spellings("tomatoes").contains(&"tomato".to_string()));
        assert!(ingredient_spellings("tomato").contains(&"tomatoes".to_string()));
        assert_eq!(ingredient_spellings("red lentils")[0], "red lentils");
        assert!(ingredient_spellings("s").iter().all(|form| !form.is_empty()));
    }
}
