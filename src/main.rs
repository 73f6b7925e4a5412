//! Wikiscope CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "wikiscope")]
#[command(about = "Incremental graph reconciliation for knowledge-graph query results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Diff two graph snapshot files and print the result as JSON
    Diff {
        /// Snapshot currently displayed
        #[arg(long)]
        old: PathBuf,

        /// Snapshot to converge to
        #[arg(long)]
        new: PathBuf,
    },
    /// Turn a tabular query result into a graph snapshot
    Transform {
        /// Query result JSON (`results.bindings` rows)
        input: PathBuf,

        /// Label of the root node
        #[arg(long, default_value = "root")]
        root: String,

        /// Label given to every edge
        #[arg(long, default_value = "subclass of")]
        relation: String,
    },
    /// Replay a sequence of snapshots through a headless graph view
    Replay {
        /// JSON array of graph snapshots; the first one is mounted
        snapshots: PathBuf,

        /// View configuration file
        #[arg(short, long, default_value = "wikiscope.toml")]
        config: PathBuf,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "wikiscope={log_level},wikiscope_core={log_level},wikiscope_view={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Diff { old, new } => commands::diff(&old, &new),
        Commands::Transform {
            input,
            root,
            relation,
        } => commands::transform(&input, root, relation),
        Commands::Replay { snapshots, config } => commands::replay(&snapshots, &config).await,
        Commands::Version => {
            println!("Wikiscope v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
