use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::generate::{LogKind, ProgressSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Success,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Terminal outcome passed to [`JobWriter::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogLine {
    pub kind: LogKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
struct Job {
    status: JobStatus,
    logs: Vec<LogLine>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

/// Poll response: lines after the caller's cursor plus current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: String,
    pub status: JobStatus,
    pub logs: Vec<LogLine>,
    pub total_logs: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Process-wide registry of generation jobs.
///
/// Each job has exactly one [`JobWriter`]; everything else only reads.
/// Finished jobs are dropped once they are older than the retention window.
#[derive(Debug, Clone)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
    retention: Duration,
}

impl JobStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Job>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Job>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new running job and hand back its only writer.
    pub fn create(&self) -> JobWriter {
        self.evict_expired();
        let id = Uuid::new_v4().to_string();
        self.write().insert(
            id.clone(),
            Job {
                status: JobStatus::Running,
                logs: Vec::new(),
                started_at: Utc::now(),
                finished_at: None,
            },
        );
        debug!(job_id = %id, "job created");
        JobWriter {
            id,
            store: self.clone(),
            finished: false,
        }
    }

    /// Lines from index `since` onward. `None` for unknown or evicted ids.
    pub fn poll(&self, id: &str, since: usize) -> Option<JobSnapshot> {
        self.evict_expired();
        let jobs = self.read();
        let job = jobs.get(id)?;
        let start = since.min(job.logs.len());
        Some(JobSnapshot {
            id: id.to_string(),
            status: job.status,
            logs: job.logs[start..].to_vec(),
            total_logs: job.logs.len(),
            started_at: job.started_at,
            finished_at: job.finished_at,
        })
    }

    /// Drop finished jobs past the retention window; returns how many.
    pub fn evict_expired(&self) -> usize {
        let Ok(retention) = chrono::Duration::from_std(self.retention) else {
            return 0;
        };
        let cutoff = Utc::now() - retention;
        let mut jobs = self.write();
        let before = jobs.len();
        jobs.retain(|_, job| job.finished_at.is_none_or(|t| t > cutoff));
        let evicted = before - jobs.len();
        if evicted > 0 {
            debug!(evicted, "evicted expired jobs");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn append(&self, id: &str, kind: LogKind, message: &str) {
        if let Some(job) = self.write().get_mut(id)
            && !job.status.is_terminal()
        {
            job.logs.push(LogLine {
                kind,
                message: message.to_string(),
                timestamp: Utc::now(),
            });
        }
    }

    fn complete(&self, id: &str, outcome: JobOutcome) {
        if let Some(job) = self.write().get_mut(id)
            && !job.status.is_terminal()
        {
            job.status = match outcome {
                JobOutcome::Success => JobStatus::Success,
                JobOutcome::Error => JobStatus::Error,
            };
            job.finished_at = Some(Utc::now());
        }
    }
}

/// Exclusive write access to one job. Consumed by [`JobWriter::finish`];
/// dropping it unfinished (panic, abort) marks the job as failed.
#[derive(Debug)]
pub struct JobWriter {
    id: String,
    store: JobStore,
    finished: bool,
}

impl JobWriter {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn finish(mut self, outcome: JobOutcome) {
        self.finished = true;
        self.store.complete(&self.id, outcome);
        info!(job_id = %self.id, ?outcome, "job finished");
    }
}

impl ProgressSink for JobWriter {
    fn emit(&self, kind: LogKind, message: &str) {
        match kind {
            LogKind::Stdout | LogKind::Success => info!(job_id = %self.id, "{}", message),
            LogKind::Stderr => warn!(job_id = %self.id, "{}", message),
            LogKind::Error => error!(job_id = %self.id, "{}", message),
        }
        self.store.append(&self.id, kind, message);
    }
}

impl Drop for JobWriter {
    fn drop(&mut self) {
        if !self.finished {
            self.emit(LogKind::Error, "Job ended unexpectedly");
            self.store.complete(&self.id, JobOutcome::Error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> JobStore {
        JobStore::new(Duration::from_secs(30 * 60))
    }

    #[test]
    fn test_fresh_job_is_running_and_empty() {
        let store = store();
        let writer = store.create();
        let snap = store.poll(writer.id(), 0).unwrap();
        assert_eq!(snap.status, JobStatus::Running);
        assert!(snap.logs.is_empty());
        assert_eq!(snap.total_logs, 0);
        assert!(snap.finished_at.is_none());
        writer.finish(JobOutcome::Success);
    }

    #[test]
    fn test_finish_is_terminal() {
        let store = store();
        let writer = store.create();
        let id = writer.id().to_string();
        writer.info("working");
        writer.finish(JobOutcome::Success);

        let snap = store.poll(&id, 0).unwrap();
        assert_eq!(snap.status, JobStatus::Success);
        assert!(snap.finished_at.is_some());

        // no writer remains; the store-level guard also refuses a second transition
        store.complete(&id, JobOutcome::Error);
        store.append(&id, LogKind::Stdout, "late");
        let snap = store.poll(&id, 0).unwrap();
        assert_eq!(snap.status, JobStatus::Success);
        assert_eq!(snap.total_logs, 1);
    }

    #[test]
    fn test_since_cursor_returns_tail() {
        let store = store();
        let writer = store.create();
        for i in 0..5 {
            writer.info(&format!("line {}", i));
        }
        let snap = store.poll(writer.id(), 3).unwrap();
        assert_eq!(snap.total_logs, 5);
        let messages: Vec<_> = snap.logs.iter().map(|l| l.message.as_str()).collect();
        assert_eq!(messages, vec!["line 3", "line 4"]);

        let past_end = store.poll(writer.id(), 99).unwrap();
        assert!(past_end.logs.is_empty());
        assert_eq!(past_end.total_logs, 5);
        writer.finish(JobOutcome::Success);
    }

    #[test]
    fn test_log_kinds_and_order_preserved() {
        let store = store();
        let writer = store.create();
        writer.info("a");
        writer.warn("b");
        writer.error("c");
        writer.success("d");
        let snap = store.poll(writer.id(), 0).unwrap();
        let kinds: Vec<_> = snap.logs.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![LogKind::Stdout, LogKind::Stderr, LogKind::Error, LogKind::Success]
        );
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["logs"][3]["kind"], "success");
        writer.finish(JobOutcome::Success);
    }

    #[test]
    fn test_unknown_id_is_none() {
        assert!(store().poll("nope", 0).is_none());
    }

    #[test]
    fn test_dropped_writer_marks_error() {
        let store = store();
        let id = {
            let writer = store.create();
            writer.id().to_string()
        };
        let snap = store.poll(&id, 0).unwrap();
        assert_eq!(snap.status, JobStatus::Error);
        assert_eq!(snap.logs.last().unwrap().kind, LogKind::Error);
    }

    #[test]
    fn test_finished_jobs_evicted_after_retention() {
        let store = JobStore::new(Duration::ZERO);
        let running = store.create();
        let done = store.create();
        let done_id = done.id().to_string();
        done.finish(JobOutcome::Success);

        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(store.evict_expired(), 1);
        assert!(store.poll(&done_id, 0).is_none());
        // running jobs are never evicted
        assert!(store.poll(running.id(), 0).is_some());
        running.finish(JobOutcome::Success);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let store = store();
        let writer = store.create();
        writer.info("hello");
        let json = serde_json::to_value(store.poll(writer.id(), 0).unwrap()).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["totalLogs"], 1);
        assert_eq!(json["logs"][0]["kind"], "stdout");
        assert!(json["startedAt"].is_string());
        assert!(json["finishedAt"].is_null());
        writer.finish(JobOutcome::Success);
    }
}
