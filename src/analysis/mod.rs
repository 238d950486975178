//! Static analysis of a local checkout.
//!
//! | Module       | Responsibility                                           |
//! |--------------|----------------------------------------------------------|
//! | `classifier` | Ordered first-match-wins rules → `Classification`        |
//! | `context`    | Bounded digest of a checkout for the model prompt        |
//! | `tree`       | Depth- and breadth-capped directory listing              |
//!
//! Nothing here fails: unreadable files and directories simply do not
//! contribute to the result.

pub mod classifier;
pub mod context;
pub mod tree;

pub use classifier::{RULES, RepoFacts, Rule, classify};
pub use context::{AnalysisContext, ManifestExcerpt, SourceExcerpt, build_context};

/// Directories that never carry signal about what a project is.
pub const NOISE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "bower_components",
    "vendor",
    "target",
    "dist",
    "build",
    "out",
    ".next",
    ".nuxt",
    ".svelte-kit",
    ".cache",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".gradle",
    ".idea",
    ".terraform",
];

pub fn is_noise_dir(name: &str) -> bool {
    NOISE_DIRS.contains(&name)
}
