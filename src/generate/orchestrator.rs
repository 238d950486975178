use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use super::progress::ProgressSink;
use super::refine::{RefinementLoop, RefinementRequest};
use crate::analysis::{AnalysisContext, build_context, classify};
use crate::config::{GitSettings, ShowcaseConfig, Workspace};
use crate::errors::GenerateError;
use crate::git::{GitCli, PushOutcome, VersionControl};
use crate::manifest::{ManifestStore, ManifestWriter};
use crate::model::{HttpChatBackend, ModelClient, RetryPolicy};
use crate::models::{Classification, ManifestEntry, RepositoryReference};
use crate::templates::template_for;

/// Per-batch knobs supplied by the CLI or the HTTP request.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub iterations: u32,
    pub skip_refresh: bool,
    pub skip_push: bool,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFailure {
    pub token: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    Skipped,
    Pushed,
    NothingToCommit,
    Failed(String),
}

/// Outcome of a batch with at least one success.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub entries: Vec<ManifestEntry>,
    pub failures: Vec<RepositoryFailure>,
    pub push: PushStatus,
}

/// One async mutex per checkout directory, shared by every clone of a
/// `Generator` so concurrent jobs never work in the same checkout.
#[derive(Clone, Default)]
struct CheckoutLocks {
    inner: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl CheckoutLocks {
    async fn acquire(&self, dir: &Path, full_name: &str, sink: &dyn ProgressSink) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // Entries nobody holds or waits on can go.
            map.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(map.entry(dir.to_path_buf()).or_default())
        };
        match Arc::clone(&lock).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                sink.info(&format!("[{}] waiting for another job using this checkout", full_name));
                let guard = lock.lock_owned().await;
                debug!(path = %dir.display(), "checkout lock acquired after wait");
                guard
            }
        }
    }
}

/// Drives each repository through checkout, analysis, refinement and
/// persistence, then records the batch in the manifest.
#[derive(Clone)]
pub struct Generator {
    workspace: Workspace,
    git: GitSettings,
    max_repositories: usize,
    client: ModelClient,
    vcs: Arc<dyn VersionControl>,
    manifest: Arc<dyn ManifestWriter>,
    checkout_locks: CheckoutLocks,
}

impl Generator {
    pub fn new(
        workspace: Workspace,
        git: GitSettings,
        max_repositories: usize,
        client: ModelClient,
        vcs: Arc<dyn VersionControl>,
        manifest: Arc<dyn ManifestWriter>,
    ) -> Self {
        Self {
            workspace,
            git,
            max_repositories,
            client,
            vcs,
            manifest,
            checkout_locks: CheckoutLocks::default(),
        }
    }

    /// Production wiring: HTTP model backend, `git` CLI and the JSON manifest.
    pub fn from_config(config: &ShowcaseConfig, workspace: Workspace) -> anyhow::Result<Self> {
        let backend = HttpChatBackend::new(&config.model)?;
        let client = ModelClient::new(Arc::new(backend), RetryPolicy::from_settings(&config.model));
        let vcs = GitCli::new(Duration::from_secs(config.git.clone_timeout_secs));
        let manifest = ManifestStore::new(workspace.manifest_path());
        Ok(Self::new(
            workspace,
            config.git.clone(),
            config.generation.max_repositories,
            client,
            Arc::new(vcs),
            Arc::new(manifest),
        ))
    }

    pub fn max_repositories(&self) -> usize {
        self.max_repositories
    }

    /// Reject empty or oversized batches before any work starts.
    pub fn check_batch_size(&self, count: usize) -> Result<(), GenerateError> {
        if count == 0 {
            return Err(GenerateError::NoRepositories);
        }
        if count > self.max_repositories {
            return Err(GenerateError::TooManyRepositories {
                count,
                max: self.max_repositories,
            });
        }
        Ok(())
    }

    pub async fn run(
        &self,
        tokens: &[String],
        options: &GenerateOptions,
        sink: &dyn ProgressSink,
    ) -> Result<BatchReport, GenerateError> {
        self.check_batch_size(tokens.len())?;

        let remote_owner = self.vcs.remote_owner(&self.workspace.root).await;
        match &remote_owner {
            Some(owner) => info!(owner = %owner, "workspace remote owner"),
            None => warn!("could not determine workspace remote owner; treating all repositories as internal"),
        }

        sink.info(&format!(
            "Generating {} repositor{} with {} iteration{}",
            tokens.len(),
            if tokens.len() == 1 { "y" } else { "ies" },
            options.iterations.max(1),
            if options.iterations.max(1) == 1 { "" } else { "s" }
        ));

        let mut entries = Vec::new();
        let mut failures = Vec::new();
        for token in tokens {
            match self
                .generate_one(token, remote_owner.as_deref(), options, sink)
                .await
            {
                Ok(entry) => {
                    sink.info(&format!("[{}] wrote {}", entry.full_name, entry.path));
                    entries.push(entry);
                }
                Err(e @ GenerateError::Persistence { .. }) => {
                    sink.error(&e.to_string());
                    return Err(e);
                }
                Err(e) => {
                    warn!(repo = %token, error = %e, "skipping repository");
                    sink.error(&format!("Skipping {}: {}", token.trim(), e));
                    failures.push(RepositoryFailure {
                        token: token.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if entries.is_empty() {
            sink.error("No repository was generated successfully");
            return Err(GenerateError::NothingGenerated);
        }

        self.write_manifest(&entries).await?;
        sink.info(&format!(
            "Updated manifest with {} entr{}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" }
        ));

        let push = if options.skip_push {
            PushStatus::Skipped
        } else {
            self.push(&entries, sink).await
        };

        Ok(BatchReport {
            entries,
            failures,
            push,
        })
    }

    async fn generate_one(
        &self,
        token: &str,
        remote_owner: Option<&str>,
        options: &GenerateOptions,
        sink: &dyn ProgressSink,
    ) -> Result<ManifestEntry, GenerateError> {
        let reference = RepositoryReference::parse(token)?;
        let full_name = reference.full_name();

        // Held until the document is written.
        let _checkout_guard = self
            .checkout_locks
            .acquire(&self.workspace.checkout_path(&reference), &full_name, sink)
            .await;
        let checkout = self.acquire_checkout(&reference, options, sink).await?;
        let (classification, context) = analyze(checkout).await?;
        let template = template_for(classification);
        sink.info(&format!(
            "[{}] classified as {} (template: {})",
            full_name, classification, template.name
        ));

        let is_external = is_external(remote_owner, &reference);
        if is_external {
            sink.info(&format!("[{}] marked as external repository", full_name));
        }

        let repository_url = self.git.repository_url(&reference);
        let request = RefinementRequest {
            reference: &reference,
            repository_url: &repository_url,
            context: &context,
            template,
            is_external,
            iterations: options.iterations,
        };
        let document = RefinementLoop::new(&self.client, &options.api_key)
            .run(&request, sink)
            .await?;

        let path = self.workspace.document_path(&reference);
        write_document(&path, &document.html).await?;

        Ok(ManifestEntry {
            owner: reference.owner.clone(),
            repo: reference.name.clone(),
            full_name,
            path: self.workspace.relative_document_path(&reference),
            url: repository_url,
            is_external,
            kind: classification,
            generated_at: Utc::now(),
        })
    }

    /// Reuse, refresh or clone the checkout for `reference`.
    async fn acquire_checkout(
        &self,
        reference: &RepositoryReference,
        options: &GenerateOptions,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, GenerateError> {
        let full_name = reference.full_name();
        let dest = self.workspace.checkout_path(reference);

        if dest.exists() {
            if options.skip_refresh {
                sink.info(&format!("[{}] reusing existing checkout", full_name));
                return Ok(dest);
            }
            sink.info(&format!("[{}] refreshing checkout", full_name));
            match self.vcs.refresh(&dest).await {
                Ok(()) => return Ok(dest),
                Err(e) => {
                    sink.warn(&format!("[{}] refresh failed, re-cloning: {:#}", full_name, e));
                    if let Err(e) = tokio::fs::remove_dir_all(&dest).await {
                        warn!(path = %dest.display(), error = %e, "failed to remove stale checkout");
                    }
                }
            }
        }

        sink.info(&format!("[{}] cloning", full_name));
        let url = self.git.repository_url(reference);
        self.vcs
            .shallow_clone(&url, &dest)
            .await
            .map_err(|e| GenerateError::CloneFailed {
                full_name,
                message: format!("{:#}", e),
            })?;
        Ok(dest)
    }

    async fn write_manifest(&self, entries: &[ManifestEntry]) -> Result<(), GenerateError> {
        let manifest = Arc::clone(&self.manifest);
        let batch = entries.to_vec();
        let path = self.workspace.manifest_path();
        tokio::task::spawn_blocking(move || manifest.merge(&batch))
            .await
            .map_err(|e| anyhow!("manifest task failed: {}", e))
            .and_then(|r| r)
            .map_err(|source| GenerateError::Persistence {
                path,
                source: source.into(),
            })
    }

    async fn push(&self, entries: &[ManifestEntry], sink: &dyn ProgressSink) -> PushStatus {
        let mut paths: Vec<PathBuf> = entries.iter().map(|e| PathBuf::from(&e.path)).collect();
        if let Ok(relative) = self.workspace.manifest_path().strip_prefix(&self.workspace.root) {
            paths.push(relative.to_path_buf());
        }

        match self
            .vcs
            .commit_and_push(&self.workspace.root, &paths, &self.git.commit_message)
            .await
        {
            Ok(PushOutcome::Pushed) => {
                sink.info("Pushed showcase changes");
                PushStatus::Pushed
            }
            Ok(PushOutcome::NothingToCommit) => {
                sink.info("No showcase changes to commit");
                PushStatus::NothingToCommit
            }
            Err(e) => {
                let message = format!("{:#}", e);
                sink.warn(&format!("Push failed (documents are saved locally): {}", message));
                PushStatus::Failed(message)
            }
        }
    }
}

/// External when the workspace owner is known and differs from the repository owner.
pub fn is_external(remote_owner: Option<&str>, reference: &RepositoryReference) -> bool {
    remote_owner.is_some_and(|owner| !owner.eq_ignore_ascii_case(&reference.owner))
}

async fn analyze(checkout: PathBuf) -> Result<(Classification, AnalysisContext), GenerateError> {
    tokio::task::spawn_blocking(move || {
        let classification = classify(&checkout);
        let context = build_context(&checkout, classification);
        (classification, context)
    })
    .await
    .map_err(|e| GenerateError::Other(anyhow!("analysis task failed: {}", e)))
}

async fn write_document(path: &Path, html: &str) -> Result<(), GenerateError> {
    let persist = |source: std::io::Error| GenerateError::Persistence {
        path: path.to_path_buf(),
        source: source.into(),
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(persist)?;
    }
    tokio::fs::write(path, html).await.map_err(persist)
}
