pub mod backfill;
pub mod battle;
pub mod config;

use std::path::Path;

use anyhow::Context;
use tracing::info;

use arena_core::ArenaConfig;

const DEFAULT_CONFIG: &str = "arena.toml";

/// Load `path`, or `./arena.toml` when present, or the defaults; then fill
/// secrets from the environment.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ArenaConfig> {
    let mut config = match path {
        Some(path) => ArenaConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            ArenaConfig::from_file(Path::new(DEFAULT_CONFIG))
                .with_context(|| format!("loading {DEFAULT_CONFIG}"))?
        }
        None => {
            info!("no config file, using defaults");
            ArenaConfig::default()
        }
    };
    config.apply_env();
    Ok(config)
}
