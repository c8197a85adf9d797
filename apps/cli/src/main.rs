//! reqminer CLI: requirements extraction from project documents.
//!
//! Reads a project's PDF/DOCX/TXT files, extracts technical requirements
//! chunk by chunk with a local Ollama model, and writes a consolidated
//! context file plus an executive summary.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => commands::exit_with_usage(err),
    };
    commands::init_tracing(&cli);
    commands::run(cli).await
}
