//! Compares the text files of two folders against each other.
//!
//! For every file in one folder the tool checks which 12-digit IDs, or
//! which lines, are missing from the other folder, or diffs it line by line
//! against its counterpart. Each direction is a pass; results land as flat
//! report files in the output directory.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use folder_compare::core::config::{ComparisonKind, ConfigManager, RunOverrides};
use folder_compare::utils;

#[derive(Parser)]
#[command(name = "folder-compare")]
#[command(about = "Cross-check line-oriented text files between two folders")]
struct Cli {
    /// Path to the run configuration (defaults to ./folder-compare.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase diagnostic output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file if none exists
    Init,
    /// Check the configuration without running anything
    Validate,
    /// Run the configured comparison
    Run {
        /// A_to_B, B_to_A or BOTH (case-insensitive)
        #[arg(long)]
        mode: Option<String>,
        /// Number of worker threads
        #[arg(long)]
        workers: Option<usize>,
        /// ids, lines or diff
        #[arg(long)]
        comparison: Option<ComparisonKind>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_manager = match cli.config {
        Some(path) => ConfigManager::new_at(path),
        None => ConfigManager::new()?,
    };

    match cli.command {
        Commands::Init => utils::initialize_config(&config_manager),
        Commands::Validate => utils::validate_config(&config_manager),
        Commands::Run {
            mode,
            workers,
            comparison,
        } => utils::run_comparison(
            &config_manager,
            RunOverrides {
                mode,
                workers,
                comparison,
            },
        ),
    }
}
