//! dep-fence CLI tool.
//!
//! Usage:
//! ```bash
//! dep-fence check [OPTIONS] <GRAPH>
//! dep-fence cycles <GRAPH>
//! dep-fence list-rules
//! dep-fence init
//! ```
//!
//! `<GRAPH>` is a JSON module graph (`{"modules": [...]}`), such as the
//! output of `depcruise --output-type json`. Use `-` to read stdin.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Forbidden-dependency rule checks for module import graphs
#[derive(Parser)]
#[command(name = "dep-fence")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory where the `dep-fence.toml` search starts
    /// [default: the graph file's directory, else `.`]
    #[arg(long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a dependency graph against the configured rules
    Check(commands::check::CheckArgs),

    /// List elementary dependency cycles
    Cycles(commands::cycles::CyclesArgs),

    /// List the rules that `check` would run
    ListRules {
        /// Use these presets instead of the configured `extends` (comma-separated)
        #[arg(long)]
        preset: Option<String>,
    },

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,

        /// Presets to extend (comma-separated)
        #[arg(long, default_value = "base")]
        preset: String,
    },
}

/// Output format for check results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-violation compact format.
    Compact,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(status) => status.into(),
        Err(err) => {
            eprintln!("error: {err:#}");
            commands::Status::ConfigError.into()
        }
    }
}

fn run(cli: Cli) -> Result<commands::Status> {
    let graph = match &cli.command {
        Commands::Check(args) => Some(args.graph.as_path()),
        Commands::Cycles(args) => Some(args.graph.as_path()),
        Commands::ListRules { .. } | Commands::Init { .. } => None,
    };
    let project = config_resolver::project_dir(cli.project.as_deref(), graph);
    let source = config_resolver::resolve(&project, cli.config.as_deref());
    tracing::debug!("Using config: {source}");

    match cli.command {
        Commands::Check(args) => commands::check::run(&args, &source),
        Commands::Cycles(args) => commands::cycles::run(&args),
        Commands::ListRules { preset } => commands::list_rules::run(&source, preset.as_deref()),
        Commands::Init { force, preset } => commands::init::run(&project, &preset, force),
    }
}
