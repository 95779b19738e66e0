//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use larder_catalog::{RecipeCatalog, load_catalog};
use larder_core::{
    ConversationGraph, DisplayPayload, GraphConfig, Node, SessionManager, TurnProgress,
    TurnResult,
};
use larder_intent::{IntentClassifier, KeywordClassifier, OpenRouterClassifier};
use larder_matcher::{UserQuery, rank_query};
use larder_shared::{
    AppConfig, ClassifierProvider, LarderError, config_file_path, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// larder: find recipes for the ingredients you have.
#[derive(Parser)]
#[command(
    name = "larder",
    version,
    about = "Chat with a cooking assistant that matches recipes to your ingredients.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start an interactive conversation.
    Chat {
        /// Recipe document (defaults to `[catalog] path` from the config).
        #[arg(short, long)]
        catalog: Option<String>,

        /// Intent classifier: openrouter or keyword.
        #[arg(long)]
        classifier: Option<String>,

        /// How many recipes to suggest per answer (0 = all).
        #[arg(long)]
        max_matches: Option<usize>,
    },

    /// Rank recipes for an ingredient list and exit.
    Rank {
        /// Free-text ingredients, e.g. "eggs, flour and milk, 30 min".
        text: String,

        /// Recipe document (defaults to `[catalog] path` from the config).
        #[arg(short, long)]
        catalog: Option<String>,

        /// Print the ranked results as JSON.
        #[arg(long)]
        json: bool,

        /// How many recipes to show (0 = all).
        #[arg(long)]
        max_matches: Option<usize>,
    },

    /// Print the instructions of one recipe.
    Show {
        /// Recipe identifier.
        id: String,

        /// Recipe document (defaults to `[catalog] path` from the config).
        #[arg(short, long)]
        catalog: Option<String>,
    },

    /// Load a recipe document and report problems.
    Validate {
        /// Recipe document (defaults to `[catalog] path` from the config).
        #[arg(short, long)]
        catalog: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "larder=warn",
        1 => "larder=info",
        2 => "larder=debug",
        _ => "larder=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Chat {
            catalog,
            classifier,
            max_matches,
        } => cmd_chat(catalog.as_deref(), classifier.as_deref(), max_matches).await,
        Command::Rank {
            text,
            catalog,
            json,
            max_matches,
        } => cmd_rank(&text, catalog.as_deref(), json, max_matches).await,
        Command::Show { id, catalog } => cmd_show(&id, catalog.as_deref()).await,
        Command::Validate { catalog } => cmd_validate(catalog.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

/// Pick the catalog file: flag first, then the config file.
fn resolve_catalog_path(flag: Option<&str>, config: &AppConfig) -> Result<PathBuf> {
    if let Some(path) = flag.or(config.catalog.path.as_deref()) {
        return Ok(PathBuf::from(path));
    }

    let config_path = config_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "~/.larder/larder.toml".to_string());
    Err(eyre!(
        "no recipe catalog given: pass --catalog <file> or set [catalog] path in {config_path}"
    ))
}

fn open_catalog(flag: Option<&str>, config: &AppConfig) -> Result<RecipeCatalog> {
    let path = resolve_catalog_path(flag, config)?;
    info!(path = %path.display(), "loading recipe catalog");
    Ok(load_catalog(&path)?)
}

fn build_classifier(
    config: &AppConfig,
    catalog: &RecipeCatalog,
) -> Result<Arc<dyn IntentClassifier>> {
    let classifier: Arc<dyn IntentClassifier> = match config.classifier.provider {
        ClassifierProvider::Openrouter => Arc::new(OpenRouterClassifier::from_config(config)?),
        ClassifierProvider::Keyword => {
            Arc::new(KeywordClassifier::with_vocabulary(catalog.vocabulary()))
        }
    };
    info!(classifier = classifier.name(), "intent classifier ready");
    Ok(classifier)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_chat(
    catalog: Option<&str>,
    classifier: Option<&str>,
    max_matches: Option<usize>,
) -> Result<()> {
    let mut config = load_config()?;
    if let Some(provider) = classifier {
        config.classifier.provider = provider.parse::<ClassifierProvider>()?;
    }
    if let Some(max) = max_matches {
        config.conversation.max_matches = max;
    }

    let catalog = Arc::new(open_catalog(catalog, &config)?);
    let classifier = build_classifier(&config, &catalog)?;
    let graph = ConversationGraph::new(catalog.clone(), classifier, GraphConfig::from(&config));
    let manager = SessionManager::new(Arc::new(graph));
    let mut session = manager.start_session().await;

    println!(
        "larder: {} recipes loaded. Tell me what ingredients you have \
         (/reset to start over, /quit to leave).",
        catalog.len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let text = line.trim();

        match text {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                manager.end_session(session).await;
                session = manager.start_session().await;
                println!("larder> Starting over. What ingredients do you have?");
                continue;
            }
            _ => {}
        }

        let spinner = TurnSpinner::new()?;
        let result = manager
            .submit_turn_with_progress(session, text, &spinner)
            .await;
        spinner.finish();

        print_turn(&result?);
    }

    manager.end_session(session).await;
    Ok(())
}

fn print_turn(result: &TurnResult) {
    println!("larder> {}", result.payload);
    if result.is_retryable() {
        println!("        (send the same message again to retry)");
    }
    println!();
}

async fn cmd_rank(
    text: &str,
    catalog: Option<&str>,
    json: bool,
    max_matches: Option<usize>,
) -> Result<()> {
    let config = load_config()?;
    let catalog = open_catalog(catalog, &config)?;

    let query = UserQuery::parse(text);
    let mut results = rank_query(&catalog, &query)?;
    let limit = max_matches.unwrap_or(config.conversation.max_matches);
    if limit > 0 {
        results.truncate(limit);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No recipe uses {}.", query.ingredients().join(", "));
    } else {
        let payload = DisplayPayload::Matches {
            ingredients: query.ingredients().to_vec(),
            matches: results,
        };
        println!("{payload}");
    }

    Ok(())
}

async fn cmd_show(id: &str, catalog: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let catalog = open_catalog(catalog, &config)?;

    let recipe = catalog
        .lookup(id)
        .ok_or_else(|| LarderError::RecipeNotFound { id: id.to_string() })?;

    let payload = DisplayPayload::Instructions {
        recipe_id: recipe.id().to_string(),
        name: recipe.name().to_string(),
        steps: larder_core::InstructionRenderer::render(recipe),
    };
    println!("{payload}");
    println!();
    println!("Ingredients: {}", recipe.ingredients().join(", "));

    Ok(())
}

async fn cmd_validate(catalog: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let catalog = open_catalog(catalog, &config)?;

    println!(
        "Catalog OK: {} recipes, {} distinct ingredients.",
        catalog.len(),
        catalog.vocabulary().len()
    );
    for recipe in catalog.all() {
        println!(
            "  {:<20} {} ({} ingredients, {} steps)",
            recipe.id(),
            recipe.name(),
            recipe.ingredients().len(),
            recipe.instructions().len()
        );
    }

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner shown while a turn is being processed.
struct TurnSpinner {
    spinner: ProgressBar,
}

impl TurnSpinner {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { spinner })
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl TurnProgress for TurnSpinner {
    fn entered(&self, node: Node) {
        let message = match node {
            Node::AwaitingIntentDecision => "Checking your request",
            Node::AwaitingIngredients => "Reading ingredients",
            Node::Ranking => "Ranking recipes",
            Node::PresentingInstructions => "Fetching instructions",
            _ => return,
        };
        self.spinner.set_message(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_flag_overrides_config() {
        let mut config = AppConfig::default();
        config.catalog.path = Some("/data/recipes.json".into());

        let path = resolve_catalog_path(Some("local.json"), &config).unwrap();
        assert_eq!(path, PathBuf::from("local.json"));

        let path = resolve_catalog_path(None, &config).unwrap();
        assert_eq!(path, PathBuf::from("/data/recipes.json"));
    }

    #[test]
    fn missing_catalog_is_reported() {
        let err = resolve_catalog_path(None, &AppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--catalog"));
    }

    #[test]
    fn cli_parses_chat_flags() {
        let cli = Cli::try_parse_from([
            "larder",
            "-vv",
            "chat",
            "--catalog",
            "recipes.json",
            "--classifier",
            "keyword",
            "--max-matches",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Chat {
                catalog,
                classifier,
                max_matches,
            } => {
                assert_eq!(catalog.as_deref(), Some("recipes.json"));
                assert_eq!(classifier.as_deref(), Some("keyword"));
                assert_eq!(max_matches, Some(5));
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn keyword_classifier_needs_no_api_key() {
        let mut config = AppConfig::default();
        config.classifier.provider = ClassifierProvider::Keyword;
        let classifier = build_classifier(&config, &RecipeCatalog::default()).unwrap();
        assert_eq!(classifier.name(), "keyword");
    }
}
