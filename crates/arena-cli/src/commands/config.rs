use std::path::Path;

use anyhow::bail;

use arena_core::ArenaConfig;

pub fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(path, ArenaConfig::default().to_toml_string()?)?;
    println!("✓ Generated {}", path.display());
    Ok(())
}
