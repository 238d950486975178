use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use showcase::config::Workspace;
use showcase::logging::{self, LogOptions};

mod cmd;

#[derive(Parser)]
#[command(name = "showcase")]
#[command(version, about = "Turn repositories into visual HTML showcase pages")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Workspace root holding showcase.toml, checkouts and generated pages (defaults to the current directory)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server for job submission and polling
    Serve {
        /// Port to listen on (overrides showcase.toml)
        #[arg(long)]
        port: Option<u16>,

        /// Bind to all interfaces and allow cross-origin requests
        #[arg(long)]
        dev: bool,
    },
    /// Generate showcase pages for up to five owner/name repositories
    Generate {
        #[arg(required = true, value_name = "OWNER/NAME")]
        repos: Vec<String>,

        /// Model rounds per repository
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        iterations: Option<u32>,

        /// Reuse existing checkouts without fetching
        #[arg(long)]
        skip_refresh: bool,

        /// Do not commit and push the generated pages
        #[arg(long)]
        skip_push: bool,
    },
    /// Print the classification of a local checkout
    Classify { path: PathBuf },
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let workspace = Workspace::new(match cli.workspace.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    });

    let file_dir = matches!(cli.command, Commands::Serve { .. }).then(|| workspace.log_dir());
    let _log_guard = logging::init(&LogOptions {
        verbose: cli.verbose,
        json: cli.json_logs,
        file_dir,
    });

    match &cli.command {
        Commands::Serve { port, dev } => cmd::cmd_serve(&workspace, *port, *dev).await?,
        Commands::Generate {
            repos,
            iterations,
            skip_refresh,
            skip_push,
        } => {
            cmd::cmd_generate(
                &workspace,
                repos,
                cmd::GenerateFlags {
                    iterations: *iterations,
                    skip_refresh: *skip_refresh,
                    skip_push: *skip_push,
                },
            )
            .await?
        }
        Commands::Classify { path } => cmd::cmd_classify(path)?,
        Commands::Config => cmd::cmd_config(&workspace)?,
    }

    Ok(())
}
