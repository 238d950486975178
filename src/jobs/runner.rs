use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use tokio::task::AbortHandle;
use tracing::{info, warn};

use super::store::{JobOutcome, JobStore};
use crate::errors::GenerateError;
use crate::generate::{GenerateOptions, Generator, ProgressSink, PushStatus};

/// Starts generation batches as detached tasks and tracks them for shutdown.
#[derive(Clone)]
pub struct JobRunner {
    store: JobStore,
    generator: Generator,
    running: Arc<Mutex<HashMap<String, AbortHandle>>>,
}

impl JobRunner {
    pub fn new(store: JobStore, generator: Generator) -> Self {
        Self {
            store,
            generator,
            running: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Validate the batch size, create a job and return its id without
    /// waiting for generation.
    pub fn submit(
        &self,
        tokens: Vec<String>,
        options: GenerateOptions,
    ) -> Result<String, GenerateError> {
        self.generator.check_batch_size(tokens.len())?;

        let writer = self.store.create();
        let job_id = writer.id().to_string();
        let generator = self.generator.clone();

        let handle = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(generator.run(&tokens, &options, &writer))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(report)) => {
                    let mut summary = format!(
                        "Done: {} generated, {} skipped",
                        report.entries.len(),
                        report.failures.len()
                    );
                    if let PushStatus::Failed(_) = report.push {
                        summary.push_str(" (push failed)");
                    }
                    writer.success(&summary);
                    writer.finish(JobOutcome::Success);
                }
                Ok(Err(e)) => {
                    writer.error(&format!("Generation failed: {}", e));
                    writer.finish(JobOutcome::Error);
                }
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    writer.error(&format!("Generation crashed: {}", message));
                    writer.finish(JobOutcome::Error);
                }
            }
        });

        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        running.retain(|_, h| !h.is_finished());
        running.insert(job_id.clone(), handle.abort_handle());
        info!(job_id = %job_id, "job submitted");
        Ok(job_id)
    }

    /// Jobs whose task has not completed yet.
    pub fn active_jobs(&self) -> usize {
        let running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        running.values().filter(|h| !h.is_finished()).count()
    }

    /// Abort every in-flight job task. Aborted jobs end in `error`.
    pub fn shutdown(&self) {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        for (job_id, handle) in running.drain() {
            if !handle.is_finished() {
                warn!(job_id = %job_id, "aborting in-flight job");
                handle.abort();
            }
        }
    }
}
