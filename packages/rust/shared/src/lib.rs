//! Shared types, error model, and configuration for larder.
//!
//! This crate is the foundation depended on by all other larder crates.
//! It provides:
//! - [`LarderError`] and [`ParseError`]: the error taxonomy
//! - Domain types ([`SessionId`], [`Diet`]) and ingredient normalization
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, ClassifierConfig, ClassifierProvider, ConversationConfig,
    DEFAULT_DECLINE_MESSAGE, OpenRouterConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_api_key,
};
pub use error::{LarderError, ParseError, Result};
pub use types::{Diet, DietParseError, SessionId, ingredient_spellings, normalize_ingredient};
