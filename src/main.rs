//! Evograph CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "evograph")]
#[command(about = "Version-evolution knowledge graphs for code", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory searched for evograph.toml (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge two version graphs into one evolution graph
    Merge {
        /// Version-A graph (JSON)
        v1: PathBuf,

        /// Version-B graph (JSON)
        v2: PathBuf,

        /// Refactoring facts (JSON list)
        #[arg(long)]
        refactorings: Option<PathBuf>,

        /// Diff change set (JSON)
        #[arg(long)]
        diff: Option<PathBuf>,

        /// Version metadata (JSON list)
        #[arg(long)]
        versions: Option<PathBuf>,

        /// Label for the earlier version
        #[arg(long, default_value = "V1")]
        from_label: String,

        /// Label for the later version
        #[arg(long, default_value = "V2")]
        to_label: String,

        /// Where to write the merged graph
        #[arg(short, long, default_value = "merged.json")]
        output: PathBuf,
    },
    /// Fold pairwise evolution graphs into one timeline graph
    Timeline {
        /// Pairwise merged graphs (JSON), in chronological order
        inputs: Vec<PathBuf>,

        /// Version metadata defining the canonical ordering (JSON list)
        #[arg(long)]
        versions: PathBuf,

        /// Where to write the timeline graph
        #[arg(short, long, default_value = "timeline.json")]
        output: PathBuf,
    },
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("evograph={}", log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Evograph v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Merge {
            v1,
            v2,
            refactorings,
            diff,
            versions,
            from_label,
            to_label,
            output,
        } => commands::merge(commands::MergeArgs {
            root: cli.root,
            v1,
            v2,
            refactorings,
            diff,
            versions,
            from_label,
            to_label,
            output,
        }),
        Commands::Timeline {
            inputs,
            versions,
            output,
        } => commands::timeline(inputs, versions, output),
        Commands::Version => {
            println!("Evograph v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
