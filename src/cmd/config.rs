//! Configuration view: `showcase config`.

use anyhow::{Context, Result};
use showcase::config::{ShowcaseConfig, Workspace};

pub fn cmd_config(workspace: &Workspace) -> Result<()> {
    let (config, warnings) = super::load_config(workspace)?;

    println!();
    println!("Showcase Configuration");
    println!("======================");
    println!();
    println!("Config files (later wins):");
    for path in ShowcaseConfig::config_paths(&workspace.root) {
        let marker = if path.exists() { "found" } else { "missing" };
        println!("  {} ({})", path.display(), marker);
    }
    println!();
    println!("Workspace: {}", workspace.root.display());
    println!("  checkouts: {}", workspace.checkouts_dir().display());
    println!("  pages:     {}", workspace.output_dir().display());
    println!("  manifest:  {}", workspace.manifest_path().display());
    println!();

    println!("Effective values (with env overrides):");
    let rendered =
        toml::to_string_pretty(&config.redacted()).context("Failed to render configuration")?;
    println!("{}", rendered);

    if !warnings.is_empty() {
        println!("Warnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }
    Ok(())
}
