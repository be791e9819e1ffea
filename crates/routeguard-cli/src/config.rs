use anyhow::Result;
use std::path::PathBuf;

const DEFAULT_SEED_PATH: &str = "config/routeguard.toml";
const DEFAULT_DATA_DIR: &str = "data/grants";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub seed_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            seed_path: PathBuf::from(DEFAULT_SEED_PATH),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl CliConfig {
    pub fn resolve_config(cli_seed: Option<PathBuf>, cli_data_dir: Option<PathBuf>) -> Result<Self> {
        let env_seed = std::env::var("ROUTEGUARD_SEED_PATH").ok().map(PathBuf::from);
        let env_data_dir = std::env::var("ROUTEGUARD_DATA_DIR").ok().map(PathBuf::from);
        let config = Self::merge(cli_seed, cli_data_dir, env_seed, env_data_dir);

        if !config.seed_path.exists() {
            anyhow::bail!("Seed file not found: {}", config.seed_path.display());
        }

        Ok(config)
    }

    fn merge(cli_seed: Option<PathBuf>, cli_data_dir: Option<PathBuf>, env_seed: Option<PathBuf>, env_data_dir: Option<PathBuf>) -> Self {
        let defaults = Self::default();

        // CLI flags override environment settings
        Self {
            seed_path: cli_seed.or(env_seed).unwrap_or(defaults.seed_path),
            data_dir: cli_data_dir.or(env_data_dir).unwrap_or(defaults.data_dir),
        }
    }
}
