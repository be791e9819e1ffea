use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use crate::commands::CommandContext;
use crate::config::CliConfig;
use anyhow::Result;

/// Administer role route permissions
#[derive(Parser, Debug)]
#[command(name = "routeguard", about = "Routeguard route permission administration")]
pub struct Cli {
    /// Seed file describing routes and roles (overrides $ROUTEGUARD_SEED_PATH)
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Grant store directory (overrides $ROUTEGUARD_DATA_DIR)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands for routeguard
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the route catalog
    Catalog,

    /// Print the permission tree of a role
    Tree {
        /// Role identifier
        role: String,
    },

    /// Replace the grants of a role with exactly the given route keys
    Grant {
        /// Role identifier
        role: String,
        /// Leaf route keys to grant
        keys: Vec<String>,
    },

    /// Revoke every grant of a role
    RevokeAll {
        /// Role identifier
        role: String,
    },

    /// Print grant statistics for every role
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = CliConfig::resolve_config(cli.seed, cli.data_dir)?;

    // Create command context
    let ctx = CommandContext::new(config).await?;

    // Dispatch commands
    let output = commands::run(&ctx, cli.command).await?;
    println!("{}", output);

    Ok(())
}
