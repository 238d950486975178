//! Configuration for the showcase generator.
//!
//! Settings are layered, later layers winning:
//! built-in defaults → user config → workspace `showcase.toml` → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [generation]
//! iterations = 3
//! max_repositories = 5
//! skip_refresh = false
//! skip_push = false
//!
//! [model]
//! endpoint = "https://api.openai.com/v1"
//! model = "gpt-4o"
//! max_tokens = 16000
//! temperature = 0.7
//! timeout_secs = 120
//! max_attempts = 3
//! backoff_step_secs = 2
//!
//! [git]
//! remote_base = "https://github.com"
//! clone_timeout_secs = 90
//! commit_message = "Update showcase pages"
//!
//! [server]
//! port = 3141
//! job_retention_secs = 1800
//! sweep_interval_secs = 60
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::RepositoryReference;

pub const CONFIG_FILE_NAME: &str = "showcase.toml";

/// Environment variables consulted for the API credential, in order.
pub const API_KEY_VARS: &[&str] = &["SHOWCASE_API_KEY", "OPENAI_API_KEY"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model rounds per repository (1 initial + N-1 refinements)
    pub iterations: u32,
    /// Upper bound on repositories per batch
    pub max_repositories: usize,
    /// Reuse an existing checkout without fetching
    pub skip_refresh: bool,
    /// Skip the final commit + push
    pub skip_push: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            iterations: 3,
            max_repositories: 5,
            skip_refresh: false,
            skip_push: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_step_secs: u64,
    /// Prefer the environment; accepted here for local setups.
    pub api_key: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 16000,
            temperature: 0.7,
            timeout_secs: 120,
            max_attempts: 3,
            backoff_step_secs: 2,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    /// Base URL that `owner/name` is appended to for cloning and links
    pub remote_base: String,
    pub clone_timeout_secs: u64,
    pub commit_message: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            remote_base: "https://github.com".to_string(),
            clone_timeout_secs: 90,
            commit_message: "Update showcase pages".to_string(),
        }
    }
}

impl GitSettings {
    pub fn repository_url(&self, reference: &RepositoryReference) -> String {
        format!(
            "{}/{}/{}",
            self.remote_base.trim_end_matches('/'),
            reference.owner,
            reference.name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub job_retention_secs: u64,
    pub sweep_interval_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 3141,
            job_retention_secs: 30 * 60,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowcaseConfig {
    pub generation: GenerationSettings,
    pub model: ModelSettings,
    pub git: GitSettings,
    pub server: ServerSettings,
}

impl ShowcaseConfig {
    /// Parse a single config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse showcase.toml")
    }

    /// Merge the user config and the workspace config over the defaults.
    /// Missing files are skipped.
    pub fn load_layered(workspace_root: &Path) -> Result<Self> {
        let mut merged = toml::Table::new();
        for path in Self::config_paths(workspace_root) {
            if !path.exists() {
                continue;
            }
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let table: toml::Table = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            merge_tables(&mut merged, table);
        }
        toml::Value::Table(merged)
            .try_into()
            .context("Invalid showcase configuration")
    }

    /// Config files in increasing precedence.
    pub fn config_paths(workspace_root: &Path) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("repo-showcase").join(CONFIG_FILE_NAME));
        }
        paths.push(workspace_root.join(CONFIG_FILE_NAME));
        paths
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides using `lookup` for variable access.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = API_KEY_VARS.iter().find_map(|k| non_empty(k)) {
            self.model.api_key = Some(key);
        }
        if let Some(model) = non_empty("SHOWCASE_MODEL") {
            self.model.model = model;
        }
        if let Some(endpoint) = non_empty("SHOWCASE_ENDPOINT") {
            self.model.endpoint = endpoint;
        }
    }

    /// Clamp out-of-range values and report what was changed.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.generation.iterations == 0 {
            warnings.push("generation.iterations must be at least 1; using 1".to_string());
            self.generation.iterations = 1;
        }
        if self.generation.max_repositories == 0 {
            warnings.push("generation.max_repositories must be at least 1; using 1".to_string());
            self.generation.max_repositories = 1;
        }
        if self.model.max_attempts == 0 {
            warnings.push("model.max_attempts must be at least 1; using 1".to_string());
            self.model.max_attempts = 1;
        }
        if self.model.api_key.is_none() {
            warnings.push(format!(
                "No model API key configured (set {})",
                API_KEY_VARS.join(" or ")
            ));
        }
        warnings
    }

    /// A copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(key) = copy.model.api_key.as_mut() {
            let visible: String = key.chars().take(4).collect();
            *key = format!("{}…", visible);
        }
        copy
    }
}

/// Recursively overlay `overlay` onto `base`; tables merge, other values replace.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Filesystem layout of a showcase workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    pub root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(".showcase")
    }

    pub fn checkouts_dir(&self) -> PathBuf {
        self.state_dir().join("repos")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.state_dir().join("logs")
    }

    pub fn checkout_path(&self, reference: &RepositoryReference) -> PathBuf {
        self.checkouts_dir().join(reference.checkout_dir_name())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("showcase")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir().join("manifest.json")
    }

    /// Document path relative to the workspace root, `/`-separated.
    pub fn relative_document_path(&self, reference: &RepositoryReference) -> String {
        format!("showcase/{}/{}/index.html", reference.owner, reference.name)
    }

    pub fn document_path(&self, reference: &RepositoryReference) -> PathBuf {
        self.output_dir()
            .join(&reference.owner)
            .join(&reference.name)
            .join("index.html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = ShowcaseConfig::default();
        assert_eq!(config.generation.iterations, 3);
        assert_eq!(config.generation.max_repositories, 5);
        assert_eq!(config.model.timeout_secs, 120);
        assert_eq!(config.model.max_attempts, 3);
        assert_eq!(config.model.backoff_step_secs, 2);
        assert_eq!(config.git.clone_timeout_secs, 90);
        assert_eq!(config.server.job_retention_secs, 1800);
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let config = ShowcaseConfig::parse("[generation]\niterations = 7\n").unwrap();
        assert_eq!(config.generation.iterations, 7);
        assert_eq!(config.generation.max_repositories, 5);
        assert_eq!(config.model.model, "gpt-4o");
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(ShowcaseConfig::parse("[generation]\niterations = \"many\"\n").is_err());
    }

    #[test]
    fn test_load_layered_reads_workspace_file() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[model]\nmodel = \"local-model\"\n[server]\nport = 9000\n",
        )
        .unwrap();
        let config = ShowcaseConfig::load_layered(dir.path()).unwrap();
        assert_eq!(config.model.model, "local-model");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.model.timeout_secs, 120);
    }

    #[test]
    fn test_merge_tables_is_deep() {
        let mut base: toml::Table = toml::from_str("[model]\nmodel = \"a\"\nmax_tokens = 10\n").unwrap();
        let overlay: toml::Table = toml::from_str("[model]\nmodel = \"b\"\n").unwrap();
        merge_tables(&mut base, overlay);
        let config: ShowcaseConfig = toml::Value::Table(base).try_into().unwrap();
        assert_eq!(config.model.model, "b");
        assert_eq!(config.model.max_tokens, 10);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("OPENAI_API_KEY", "sk-openai"),
            ("SHOWCASE_MODEL", "other-model"),
            ("SHOWCASE_ENDPOINT", ""),
        ]);
        let mut config = ShowcaseConfig::default();
        config.apply_env_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.model.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.model.model, "other-model");
        assert_eq!(config.model.endpoint, "https://api.openai.com/v1");
    }

    #[test]
    fn test_showcase_key_wins_over_openai_key() {
        let env: HashMap<&str, &str> =
            HashMap::from([("OPENAI_API_KEY", "sk-openai"), ("SHOWCASE_API_KEY", "sk-showcase")]);
        let mut config = ShowcaseConfig::default();
        config.apply_env_from(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.model.api_key.as_deref(), Some("sk-showcase"));
    }

    #[test]
    fn test_validate_clamps_zero_iterations() {
        let mut config = ShowcaseConfig::default();
        config.generation.iterations = 0;
        config.model.api_key = Some("k".into());
        let warnings = config.validate();
        assert_eq!(config.generation.iterations, 1);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("iterations"));
    }

    #[test]
    fn test_redacted_masks_key() {
        let mut config = ShowcaseConfig::default();
        config.model.api_key = Some("sk-very-secret".into());
        let shown = config.redacted();
        assert_eq!(shown.model.api_key.as_deref(), Some("sk-v…"));
    }

    #[test]
    fn test_workspace_layout() {
        let ws = Workspace::new("/work");
        let r = RepositoryReference::parse("foo/bar").unwrap();
        assert_eq!(ws.checkout_path(&r), PathBuf::from("/work/.showcase/repos/foo__bar"));
        assert_eq!(ws.document_path(&r), PathBuf::from("/work/showcase/foo/bar/index.html"));
        assert_eq!(ws.relative_document_path(&r), "showcase/foo/bar/index.html");
        assert_eq!(ws.manifest_path(), PathBuf::from("/work/showcase/manifest.json"));
    }

    #[test]
    fn test_repository_url() {
        let git = GitSettings {
            remote_base: "https://github.com/".into(),
            ..GitSettings::default()
        };
        let r = RepositoryReference::parse("foo/bar").unwrap();
        assert_eq!(git.repository_url(&r), "https://github.com/foo/bar");
    }
}
