//! Strata CLI — the command-line interface for the Strata analysis engine.
//!
//! Provides `strata init` for project scaffolding, `strata check` for a
//! full analysis run, `strata query` for single facts, and
//! `strata session` for speculative overlay edits.

#![warn(missing_docs)]

mod check;
mod init;
mod pipeline;
mod query;
mod session;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// Strata — an incremental semantic-analysis engine.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Strata incremental analysis")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `strata.toml` (file or project directory).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new Strata project.
    Init {
        /// Project name (creates a subdirectory). If omitted, initializes
        /// the current directory.
        name: Option<String>,
    },
    /// Analyze the whole project and report diagnostics.
    Check(CheckArgs),
    /// Query a single fact: `module` or `module.name`.
    Query(QueryArgs),
    /// Re-analyze one file with replacement content in an overlay,
    /// without touching the shared state.
    Session(SessionArgs),
}

/// Arguments for `strata check`.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for `strata query`.
#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// `module` for its exports and diagnostics, or `module.name` for
    /// one export's type.
    pub target: String,
}

/// Arguments for `strata session`.
#[derive(Parser, Debug)]
pub struct SessionArgs {
    /// The project file to speculatively replace.
    pub path: String,

    /// File holding the replacement content; `-` reads stdin.
    #[arg(long)]
    pub with: String,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Diagnostic output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable lines.
    Text,
    /// One JSON array of diagnostic objects.
    Json,
}

fn init_tracing(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let outcome = match &cli.command {
        Command::Init { name } => init::run(name.as_deref()),
        Command::Check(args) => check::run(&cli, args),
        Command::Query(args) => query::run(&cli, args),
        Command::Session(args) => session::run(&cli, args),
    };

    match outcome {
        Ok(code) => process::exit(code),
        Err(error) => {
            eprintln!("error: {error}");
            process::exit(2);
        }
    }
}
