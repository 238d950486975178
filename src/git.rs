//! Version-control operations, performed by shelling out to `git`.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use tracing::debug;

use crate::util::truncate_chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Pushed,
    NothingToCommit,
}

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Owner segment of the workspace's `origin` remote, if it can be determined.
    async fn remote_owner(&self, workspace: &Path) -> Option<String>;

    /// Depth-1 clone of `url` into `dest`. A partial `dest` is removed on failure.
    async fn shallow_clone(&self, url: &str, dest: &Path) -> Result<()>;

    /// Bring an existing shallow checkout up to date with its remote.
    async fn refresh(&self, checkout: &Path) -> Result<()>;

    /// Stage `paths`, commit, and push the current branch.
    async fn commit_and_push(
        &self,
        workspace: &Path,
        paths: &[PathBuf],
        message: &str,
    ) -> Result<PushOutcome>;
}

/// [`VersionControl`] backed by the `git` binary on `PATH`.
#[derive(Debug, Clone)]
pub struct GitCli {
    timeout: Duration,
}

impl GitCli {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<Output> {
        let mut cmd = tokio::process::Command::new("git");
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(?args, "running git");
        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(output) => output.with_context(|| format!("Failed to run git {}", args.join(" "))),
            Err(_) => bail!(
                "git {} timed out after {}s",
                args.first().copied().unwrap_or_default(),
                self.timeout.as_secs()
            ),
        }
    }

    async fn run_checked(&self, cwd: Option<&Path>, args: &[&str]) -> Result<Output> {
        let output = self.run(cwd, args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                truncate_chars(stderr.trim(), 400)
            );
        }
        Ok(output)
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn remote_owner(&self, workspace: &Path) -> Option<String> {
        let output = self
            .run(Some(workspace), &["remote", "get-url", "origin"])
            .await
            .ok()?;
        if !output.status.success() {
            return None;
        }
        parse_remote_owner(&String::from_utf8_lossy(&output.stdout))
    }

    async fn shallow_clone(&self, url: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let dest_str = dest.to_string_lossy();
        let result = self
            .run_checked(None, &["clone", "--depth", "1", url, &dest_str])
            .await;
        if result.is_err() && dest.exists() {
            let _ = tokio::fs::remove_dir_all(dest).await;
        }
        result.map(|_| ())
    }

    async fn refresh(&self, checkout: &Path) -> Result<()> {
        self.run_checked(Some(checkout), &["fetch", "--depth", "1", "origin"])
            .await?;
        self.run_checked(Some(checkout), &["reset", "--hard", "FETCH_HEAD"])
            .await?;
        Ok(())
    }

    async fn commit_and_push(
        &self,
        workspace: &Path,
        paths: &[PathBuf],
        message: &str,
    ) -> Result<PushOutcome> {
        let path_args: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let mut add: Vec<&str> = vec!["add", "--"];
        add.extend(path_args.iter().map(String::as_str));
        self.run_checked(Some(workspace), &add).await?;

        let staged = self
            .run(Some(workspace), &["diff", "--cached", "--quiet"])
            .await?;
        if staged.status.success() {
            return Ok(PushOutcome::NothingToCommit);
        }

        self.run_checked(Some(workspace), &["commit", "-m", message])
            .await?;
        self.run_checked(Some(workspace), &["push", "origin", "HEAD"])
            .await?;
        Ok(PushOutcome::Pushed)
    }
}

/// Extract the owner from an `origin` URL.
///
/// Handles `https://host/owner/repo(.git)`, credentials in the authority,
/// and scp-style `git@host:owner/repo.git`.
pub fn parse_remote_owner(url: &str) -> Option<String> {
    let url = url.trim().trim_end_matches('/').trim_end_matches(".git");
    let path = if let Some((_, rest)) = url.split_once("://") {
        rest.split_once('/').map(|(_, path)| path)?
    } else if let Some((host, path)) = url.split_once(':') {
        if host.contains('/') {
            return None;
        }
        path
    } else {
        return None;
    };

    let mut parts = path.split('/').filter(|s| !s.is_empty());
    let owner = parts.next()?;
    parts.next()?;
    Some(owner.to_string())
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_https_remote() {
        assert_eq!(
            parse_remote_owner("https://github.com/acme/site.git\n"),
            Some("acme".to_string())
        );
        assert_eq!(
            parse_remote_owner("https://TOKEN@github.com/acme/site"),
            Some("acme".to_string())
        );
    }

    #[test]
    fn test_parse_scp_remote() {
        assert_eq!(
            parse_remote_owner("git@github.com:acme/site.git"),
            Some("acme".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_unrecognized() {
        assert_eq!(parse_remote_owner(""), None);
        assert_eq!(parse_remote_owner("https://github.com/acme"), None);
        assert_eq!(parse_remote_owner("/local/path/repo"), None);
    }

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    fn init_repo_with_commit(dir: &Path) {
        git(dir, &["init", "-q"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        git(dir, &["config", "user.name", "Test"]);
        std::fs::write(dir.join("README.md"), "# hello\n").unwrap();
        git(dir, &["add", "."]);
        git(dir, &["commit", "-q", "-m", "init"]);
    }

    #[tokio::test]
    async fn test_remote_owner_reads_origin() {
        if !git_available() {
            return;
        }
        let dir = tempdir().unwrap();
        git(dir.path(), &["init", "-q"]);
        git(
            dir.path(),
            &["remote", "add", "origin", "https://github.com/someone/showcase.git"],
        );
        let vcs = GitCli::new(Duration::from_secs(30));
        assert_eq!(vcs.remote_owner(dir.path()).await, Some("someone".to_string()));
    }

    #[tokio::test]
    async fn test_remote_owner_without_repo_is_none() {
        if !git_available() {
            return;
        }
        let dir = tempdir().unwrap();
        let vcs = GitCli::new(Duration::from_secs(30));
        assert_eq!(vcs.remote_owner(dir.path()).await, None);
    }

    #[tokio::test]
    async fn test_clone_then_refresh() {
        if !git_available() {
            return;
        }
        let upstream = tempdir().unwrap();
        init_repo_with_commit(upstream.path());

        let work = tempdir().unwrap();
        let dest = work.path().join("repos").join("acme__site");
        let url = format!("file://{}", upstream.path().display());
        let vcs = GitCli::new(Duration::from_secs(30));

        vcs.shallow_clone(&url, &dest).await.unwrap();
        assert!(dest.join("README.md").exists());

        std::fs::write(upstream.path().join("README.md"), "# changed\n").unwrap();
        git(upstream.path(), &["commit", "-q", "-am", "change"]);

        vcs.refresh(&dest).await.unwrap();
        let readme = std::fs::read_to_string(dest.join("README.md")).unwrap();
        assert_eq!(readme, "# changed\n");
    }

    #[tokio::test]
    async fn test_failed_clone_leaves_no_directory() {
        if !git_available() {
            return;
        }
        let work = tempdir().unwrap();
        let dest = work.path().join("missing");
        let url = format!("file://{}/does-not-exist", work.path().display());
        let vcs = GitCli::new(Duration::from_secs(30));
        assert!(vcs.shallow_clone(&url, &dest).await.is_err());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_commit_and_push_to_bare_remote() {
        if !git_available() {
            return;
        }
        let remote = tempdir().unwrap();
        git(remote.path(), &["init", "-q", "--bare"]);

        let ws = tempdir().unwrap();
        init_repo_with_commit(ws.path());
        let remote_url = remote.path().to_string_lossy().into_owned();
        git(ws.path(), &["remote", "add", "origin", &remote_url]);

        let page = PathBuf::from("showcase/acme/site/index.html");
        std::fs::create_dir_all(ws.path().join("showcase/acme/site")).unwrap();
        std::fs::write(ws.path().join(&page), "<html></html>").unwrap();

        let vcs = GitCli::new(Duration::from_secs(30));
        let outcome = vcs
            .commit_and_push(ws.path(), &[page.clone()], "Update showcase pages")
            .await
            .unwrap();
        assert_eq!(outcome, PushOutcome::Pushed);

        let again = vcs
            .commit_and_push(ws.path(), &[page], "Update showcase pages")
            .await
            .unwrap();
        assert_eq!(again, PushOutcome::NothingToCommit);
    }
}
