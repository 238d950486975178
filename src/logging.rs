//! Tracing setup shared by every subcommand.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbose: bool,
    /// Emit JSON lines on stderr instead of human-readable output.
    pub json: bool,
    /// Also write JSON logs to a daily-rotated file in this directory.
    pub file_dir: Option<PathBuf>,
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "info,showcase=debug,repo_showcase=debug"
    } else {
        "warn,showcase=info,repo_showcase=info"
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process. Installing twice is a no-op.
pub fn init(options: &LogOptions) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(options.verbose)));

    let stderr_layer = if options.json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(options.verbose)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file_layer, guard) = match options.file_dir.as_ref() {
        Some(dir) if std::fs::create_dir_all(dir).is_ok() => {
            let appender = tracing_appender::rolling::daily(dir, "showcase.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed();
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    guard
}
