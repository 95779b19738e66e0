//! Application configuration for larder.
//!
//! User config lives at `~/.larder/larder.toml`.
//! CLI flags override config file values, which override defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LarderError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "larder.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".larder";

/// Message shown when a request is not about food or cooking.
pub const DEFAULT_DECLINE_MESSAGE: &str = "I'm sorry, I'm a specialized cooking assistant. \
     I can only help with food, recipes, and ingredients.";

// ---------------------------------------------------------------------------
// Config structs (matching larder.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Recipe catalog source.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Intent classifier selection and retry policy.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// OpenRouter settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Conversation behaviour.
    #[serde(default)]
    pub conversation: ConversationConfig,
}

/// `[catalog]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Default recipe document, used when `--catalog` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Which classifier backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierProvider {
    /// Remote LLM via OpenRouter.
    #[default]
    Openrouter,
    /// Offline keyword heuristic.
    Keyword,
}

impl fmt::Display for ClassifierProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Openrouter => "openrouter",
            Self::Keyword => "keyword",
        };
        f.write_str(s)
    }
}

impl FromStr for ClassifierProvider {
    type Err = LarderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "openrouter" => Ok(Self::Openrouter),
            "keyword" => Ok(Self::Keyword),
            other => Err(LarderError::config(format!(
                "unknown classifier provider '{other}': expected 'openrouter' or 'keyword'"
            ))),
        }
    }
}

/// `[classifier]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Backend used for intent classification.
    #[serde(default)]
    pub provider: ClassifierProvider,

    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Attempts per turn before the turn is reported as unavailable.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: ClassifierProvider::default(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    8_000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    250
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for intent classification.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// API base URL (chat completions live under `<base>/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            default_model: default_model(),
            base_url: default_base_url(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "meta-llama/llama-3.1-8b-instruct".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}

/// `[conversation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// How many ranked recipes are presented (0 = all).
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,

    /// Fixed reply for off-topic requests.
    #[serde(default = "default_decline_message")]
    pub decline_message: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_matches: default_max_matches(),
            decline_message: default_decline_message(),
        }
    }
}

fn default_max_matches() -> usize {
    3
}
fn default_decline_message() -> String {
    DEFAULT_DECLINE_MESSAGE.into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.larder/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LarderError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.larder/larder.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LarderError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LarderError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LarderError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LarderError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LarderError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the OpenRouter API key env var is set and non-empty.
/// Returns the key.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openrouter.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(LarderError::config(format!(
            "OpenRouter API key not found. Set the {var_name} environment variable, \
             or use the offline classifier with `--classifier keyword`."
        ))),
    }
}
