//! Init command - write a default configuration file

use anyhow::{Context, Result};
use commitguard::config::{CONFIG_FILE, DEFAULT_CONFIG_TOML};
use console::style;
use std::path::Path;

pub fn run(dir: &Path, force: bool) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Path is not a directory: {}", dir.display());
    }

    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() && !force {
        println!(
            "{} {} already exists (use --force to overwrite)",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
        return Ok(());
    }

    std::fs::write(&config_path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );

    println!("\nNext steps:");
    println!("  {} Build a history snapshot", style("commitguard ingest .").cyan());
    println!("  {} Score a commit", style("commitguard score payload.json -s commitguard-snapshot.json").cyan());

    Ok(())
}
