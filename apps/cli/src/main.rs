//! larder CLI: a cooking assistant that matches recipes to the ingredients
//! you have.
//!
//! Loads a recipe document, checks each request is about food, ranks the
//! catalog by ingredient overlap and walks you through the chosen recipe.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
