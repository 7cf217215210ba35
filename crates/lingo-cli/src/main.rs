//! Lingo CLI - interactive language-tutoring client.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;

/// Lingo - practice a language with an AI tutor
#[derive(Parser)]
#[command(name = "lingo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive tutoring session
    Chat {
        /// Backend configuration file
        #[arg(long, default_value = "lingo.json")]
        config: PathBuf,
        /// Session database
        #[arg(long, default_value = "lingo.db")]
        db: PathBuf,
        /// Override the history window (turns fed to the backend)
        #[arg(long)]
        window: Option<usize>,
    },

    /// Show the resolved backend configuration
    Info {
        /// Backend configuration file
        #[arg(long, default_value = "lingo.json")]
        config: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "warn" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    match cli.command {
        Commands::Chat { config, db, window } => tokio::runtime::Runtime::new()
            .map_err(|e| miette::miette!("failed to start runtime: {e}"))?
            .block_on(commands::chat::run(&config, &db, window)),
        Commands::Info { config } => commands::info::run(&config),
    }
}
