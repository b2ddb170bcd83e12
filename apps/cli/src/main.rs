//! DeFi trainer CLI. Prepares Solana DeFi fine-tuning data for a local model server.
//!
//! Reads the knowledge base, builds training examples, embeds their contexts,
//! writes the output artifact, and smoke-tests the chat endpoint.

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
