//! Provides the main entry point to the program.
use anyhow::Result;
use microsizer::cli::run_cli;

fn main() -> Result<()> {
    run_cli()
}
