//! # Schemata CLI
//!
//! Command-line interface for planning and applying schema migrations.
//!
//! ## Commands
//!
//! - `plan` - Show the operations between two configurations
//! - `install` - Show the fresh-install plan of a configuration
//! - `apply` - Run a plan against a database
//! - `install-root` - Create missing shared tables
//! - `validate` - Check a configuration for problems
//!

pub mod backend;
pub mod output;
pub mod settings;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use schemata_core::MySqlDialect;
use schemata_ir::{Snapshot, load_snapshot, validate_snapshot};
use schemata_planner::{Operation, Planner, apply_plan};
use std::path::{Path, PathBuf};
use tracing::info;

pub use backend::Backend;
pub use output::PlanFormat;
pub use settings::Settings;

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Arguments
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "schemata")]
#[command(about = "Plan and apply schema migrations from entity configuration")]
#[command(version)]
pub struct Cli {
    /// Settings file (defaults to ./schemata.toml when present)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Application name, used as table prefix
    #[arg(long, global = true, env = "SCHEMATA_APP")]
    pub app: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the operations that migrate one configuration to another
    Plan {
        /// Configuration being migrated to
        #[arg(long)]
        new: PathBuf,

        /// Configuration currently installed; omit for a first install
        #[arg(long)]
        old: Option<PathBuf>,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Show the fresh-install plan of a configuration
    Install {
        #[arg(long)]
        new: PathBuf,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Apply a plan to a database, stopping at the first failure
    Apply {
        #[arg(long)]
        new: PathBuf,

        #[arg(long)]
        old: Option<PathBuf>,

        #[command(flatten)]
        database: DatabaseArgs,
    },

    /// Create shared tables that are missing from the database
    InstallRoot {
        #[arg(long)]
        config: PathBuf,

        #[command(flatten)]
        database: DatabaseArgs,
    },

    /// Check a configuration for problems
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
pub struct FormatArgs {
    /// Print bare SQL statements
    #[arg(long, conflicts_with = "json")]
    pub sql: bool,

    /// Print the operations as JSON
    #[arg(long)]
    pub json: bool,
}

impl FormatArgs {
    pub fn format(&self) -> PlanFormat {
        if self.sql {
            PlanFormat::Sql
        } else if self.json {
            PlanFormat::Json
        } else {
            PlanFormat::Pretty
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct DatabaseArgs {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Show what would be executed without touching a database
    #[arg(long)]
    pub dry_run: bool,
}

// ============================================================================
// Dispatch
// ============================================================================

/// Run a parsed command line with loaded settings
pub fn run(cli: Cli, settings: Settings) -> anyhow::Result<()> {
    let app = settings.resolve_app(cli.app.as_deref());
    let planner = Planner::new(MySqlDialect, app.clone(), settings.planner.clone());

    match cli.command {
        Command::Plan { new, old, format } => {
            let new = snapshot(&new, &app)?;
            let old = old.map(|path| snapshot(&path, &app)).transpose()?;
            let ops = planner.plan_diff(old.as_ref(), &new);
            print_plan(&ops, format.format(), cli.quiet)
        }

        Command::Install { new, format } => {
            let new = snapshot(&new, &app)?;
            let ops = planner.plan_install(&new);
            print_plan(&ops, format.format(), cli.quiet)
        }

        Command::Apply { new, old, database } => {
            let new = snapshot(&new, &app)?;
            let old = old.map(|path| snapshot(&path, &app)).transpose()?;
            let url = settings.resolve_database_url(database.database_url.as_deref());
            let mut backend = Backend::resolve(url.as_deref(), database.dry_run)?;

            if backend.is_dry_run() {
                // the in-memory catalog starts out holding the old schema
                if let Some(old) = &old {
                    apply_plan(&planner.plan_install(old), backend.connection())
                        .context("Failed to replay the old configuration")?;
                }
            }

            let ops = planner.plan_diff(old.as_ref(), &new);
            print_plan(&ops, PlanFormat::Pretty, cli.quiet)?;

            let report = apply_plan(&ops, backend.connection()).context("Migration failed")?;
            if !cli.quiet {
                println!("{}", output::render_report(&report, backend.is_dry_run()));
            }
            Ok(())
        }

        Command::InstallRoot { config, database } => {
            let snapshot = snapshot(&config, &app)?;
            let url = settings.resolve_database_url(database.database_url.as_deref());
            let mut backend = Backend::resolve(url.as_deref(), database.dry_run)?;

            let ops = planner.plan_root_install(backend.connection(), &snapshot)?;
            print_plan(&ops, PlanFormat::Pretty, cli.quiet)?;
            let report =
                apply_plan(&ops, backend.connection()).context("Root installation failed")?;
            info!(created = report.operations, "Root installation finished");
            if !cli.quiet {
                println!("{}", output::render_report(&report, backend.is_dry_run()));
            }
            Ok(())
        }

        Command::Validate { config } => {
            let snapshot = snapshot(&config, &app)?;
            let result = validate_snapshot(&snapshot);
            let valid = result.valid;
            if !cli.quiet || !valid {
                println!("{}", output::render_validation(&result));
            }
            let errors = result.errors.len();
            result.to_result().with_context(|| {
                format!("Configuration '{}' has {errors} error(s)", config.display())
            })?;
            Ok(())
        }
    }
}

fn snapshot(path: &Path, app: &str) -> anyhow::Result<Snapshot> {
    load_snapshot(path, app)
        .with_context(|| format!("Failed to load configuration '{}'", path.display()))
}

fn print_plan(ops: &[Operation], format: PlanFormat, quiet: bool) -> anyhow::Result<()> {
    if quiet && format == PlanFormat::Pretty {
        return Ok(());
    }
    println!("{}", output::render_plan(ops, format)?);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
