pub mod permissions;

use crate::Commands;
use crate::config::CliConfig;
use anyhow::{Context, Result};
use routeguard_core::{FileGrantStore, PermissionEngine, Seed};
use std::sync::Arc;

pub struct CommandContext {
    pub engine: PermissionEngine,
}

impl CommandContext {
    pub async fn new(config: CliConfig) -> Result<Self> {
        let seed = Seed::load(&config.seed_path)
            .await
            .with_context(|| format!("Failed to load seed {}", config.seed_path.display()))?;
        let (catalog, roles) = seed.into_parts().context("Invalid seed file")?;
        let store = FileGrantStore::open(&config.data_dir)
            .await
            .with_context(|| format!("Failed to open grant store at {}", config.data_dir.display()))?;

        let engine = PermissionEngine::new(Arc::new(catalog), Arc::new(roles), Arc::new(store));
        Ok(Self { engine })
    }
}

/// Run a command and return its rendered output
pub async fn run(ctx: &CommandContext, command: Commands) -> Result<String> {
    match command {
        Commands::Catalog => permissions::show_catalog(ctx).await,
        Commands::Tree { role } => permissions::show_tree(ctx, &role).await,
        Commands::Grant { role, keys } => permissions::grant(ctx, &role, keys).await,
        Commands::RevokeAll { role } => permissions::revoke_all(ctx, &role).await,
        Commands::Summary => permissions::show_summary(ctx).await,
    }
}
