//! ## reactorsim-cli
//! **Command line front end to the reactor simulator**
//!
//! Evaluates grid files, lists the component catalog and dumps per-slot
//! heat for debugging layouts.

use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::run_command(cli).await
}
