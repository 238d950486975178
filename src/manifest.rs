//! Registry of generated pages, persisted as a JSON array.
//!
//! Entries are keyed by `fullName`. A merge replaces an existing entry in place
//! or appends a new one, so the file never holds two entries for one repository.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::debug;

use crate::models::ManifestEntry;

/// Destination for a batch's entries. Called once per batch.
pub trait ManifestWriter: Send + Sync {
    fn merge(&self, entries: &[ManifestEntry]) -> Result<()>;
}

/// JSON file store guarded by an exclusive lock on a sidecar `.lock` file.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "manifest.json".into());
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Current entries in file order. A missing file is an empty manifest.
    pub fn load(&self) -> Result<Vec<ManifestEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read manifest {}", self.path.display()));
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest {}", self.path.display()))
    }

    /// Entries keyed by `fullName`.
    pub fn load_map(&self) -> Result<BTreeMap<String, ManifestEntry>> {
        Ok(self
            .load()?
            .into_iter()
            .map(|e| (e.full_name.clone(), e))
            .collect())
    }

    fn write_atomic(&self, entries: &[ManifestEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).context("Failed to serialize manifest")?;
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp)
                .with_context(|| format!("Failed to create {}", tmp.display()))?;
            file.write_all(json.as_bytes())
                .with_context(|| format!("Failed to write {}", tmp.display()))?;
            file.sync_all().ok();
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace manifest {}", self.path.display()))
    }
}

impl ManifestWriter for ManifestStore {
    fn merge(&self, entries: &[ManifestEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let lock_path = self.lock_path();
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open {}", lock_path.display()))?;
        lock.lock_exclusive()
            .with_context(|| format!("Failed to lock {}", lock_path.display()))?;

        let result = self.load().and_then(|mut current| {
            upsert_all(&mut current, entries);
            debug!(entries = current.len(), path = %self.path.display(), "writing manifest");
            self.write_atomic(&current)
        });

        let _ = FileExt::unlock(&lock);
        result
    }
}

/// Replace entries with a matching `fullName` in place; append the rest.
pub fn upsert_all(current: &mut Vec<ManifestEntry>, incoming: &[ManifestEntry]) {
    for entry in incoming {
        match current.iter_mut().find(|e| e.full_name == entry.full_name) {
            Some(slot) => *slot = entry.clone(),
            None => current.push(entry.clone()),
        }
    }
}
