//! bookbinder CLI — AI-assisted text-to-EPUB converter.
//!
//! Turns a raw text file into a structured EPUB by delegating title, author,
//! and chapter detection to a language model.

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
