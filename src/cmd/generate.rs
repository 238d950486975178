//! Synchronous batch generation: `showcase generate`.

use anyhow::{Result, bail};
use console::style;
use showcase::config::{API_KEY_VARS, Workspace};
use showcase::generate::{GenerateOptions, Generator, LogKind, ProgressSink, PushStatus};

/// Flags that override the `[generation]` config section.
pub struct GenerateFlags {
    pub iterations: Option<u32>,
    pub skip_refresh: bool,
    pub skip_push: bool,
}

/// Prints progress lines to the terminal as they arrive.
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn emit(&self, kind: LogKind, message: &str) {
        match kind {
            LogKind::Stdout => println!("{} {}", style("›").cyan(), message),
            LogKind::Success => println!("{} {}", style("✓").green().bold(), style(message).green()),
            LogKind::Stderr => eprintln!("{} {}", style("!").yellow().bold(), style(message).yellow()),
            LogKind::Error => eprintln!("{} {}", style("✗").red().bold(), style(message).red()),
        }
    }
}

pub async fn cmd_generate(workspace: &Workspace, repos: &[String], flags: GenerateFlags) -> Result<()> {
    let (config, _) = super::load_config(workspace)?;
    let generator = Generator::from_config(&config, workspace.clone())?;
    generator.check_batch_size(repos.len())?;

    let Some(api_key) = config.model.api_key.clone() else {
        bail!(
            "No model API key configured. Set {} (or [model].api_key in showcase.toml).",
            API_KEY_VARS.join(" or ")
        );
    };

    let options = GenerateOptions {
        iterations: flags.iterations.unwrap_or(config.generation.iterations),
        skip_refresh: flags.skip_refresh || config.generation.skip_refresh,
        skip_push: flags.skip_push || config.generation.skip_push,
        api_key,
    };

    let report = generator.run(repos, &options, &ConsoleSink).await?;

    println!();
    println!(
        "{} {} page{} generated, {} skipped",
        style("✓").green().bold(),
        report.entries.len(),
        if report.entries.len() == 1 { "" } else { "s" },
        report.failures.len()
    );
    for entry in &report.entries {
        println!(
            "  {} {} {}",
            style(&entry.full_name).bold(),
            style(entry.kind).dim(),
            entry.path
        );
    }
    for failure in &report.failures {
        println!("  {} {}: {}", style("skipped").yellow(), failure.token, failure.message);
    }
    if let PushStatus::Failed(message) = &report.push {
        println!("  {} push failed: {}", style("!").yellow(), message);
    }
    Ok(())
}
