//! CLI command implementations.
//!
//! | Module     | Commands handled |
//! |------------|------------------|
//! | `serve`    | `Serve`          |
//! | `generate` | `Generate`       |
//! | `classify` | `Classify`       |
//! | `config`   | `Config`         |

pub mod classify;
pub mod config;
pub mod generate;
pub mod serve;

pub use classify::cmd_classify;
pub use config::cmd_config;
pub use generate::{GenerateFlags, cmd_generate};
pub use serve::cmd_serve;

use anyhow::Result;
use showcase::config::{ShowcaseConfig, Workspace};
use tracing::warn;

/// Layered config for `workspace` with environment overrides applied and
/// out-of-range values clamped.
pub fn load_config(workspace: &Workspace) -> Result<(ShowcaseConfig, Vec<String>)> {
    let mut config = ShowcaseConfig::load_layered(&workspace.root)?;
    config.apply_env();
    let warnings = config.validate();
    for w in &warnings {
        warn!("{}", w);
    }
    Ok((config, warnings))
}
