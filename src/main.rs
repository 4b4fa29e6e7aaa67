//! Schemata
//!
//! Schema migration planner and DDL generator for entity configurations.
//!
//! This is the entry point of the `schemata` command.

use anyhow::Context;
use clap::Parser;
use schemata_cli::{Cli, Settings};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // DATABASE_URL and friends may live in .env
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match try_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> anyhow::Result<()> {
    let settings =
        Settings::load_or_default(cli.settings.as_deref()).context("Failed to load settings")?;

    // Initialize logging
    let filter = settings.resolve_log_filter(
        std::env::var("RUST_LOG").ok().as_deref(),
        cli.verbose,
        cli.quiet,
    );
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    schemata_cli::run(cli, settings)
}
