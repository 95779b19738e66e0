//! Query parsing and ingredient-overlap ranking for larder.
//!
//! - [`UserQuery`] turns free text into normalized ingredient names plus
//!   optional [`Preferences`] (time cap, dietary restrictions).
//! - [`rank`] scores catalog recipes against those names and returns
//!   [`MatchResult`]s best-first. Ranking is a pure function of its inputs.

mod query;
mod rank;

pub use query::{Preferences, UserQuery};
pub use rank::{MatchResult, compare, rank, rank_filtered, rank_query, score};
