use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::backend::{ChatBackend, ChatMessage};
use super::extract::extract_document;
use crate::config::ModelSettings;
use crate::errors::ModelCallError;

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `backoff_step * n`.
    pub backoff_step: Duration,
    /// Hard limit on a single attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(2),
            timeout: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            backoff_step: Duration::from_secs(settings.backoff_step_secs),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// The extracted document from one successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub document: String,
    pub tokens_per_second: Option<f64>,
}

/// Retrying wrapper around a [`ChatBackend`].
#[derive(Clone)]
pub struct ModelClient {
    backend: Arc<dyn ChatBackend>,
    policy: RetryPolicy,
}

impl ModelClient {
    pub fn new(backend: Arc<dyn ChatBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `conversation`, retrying up to the policy's attempt budget.
    /// The last attempt's error is returned inside `ModelCallError::Exhausted`.
    pub async fn complete(
        &self,
        api_key: &str,
        conversation: &[ChatMessage],
    ) -> Result<Completion, ModelCallError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(
                self.policy.timeout,
                self.backend.send(api_key, conversation),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ModelCallError::Timeout(self.policy.timeout)),
            };

            match outcome {
                Ok(reply) => {
                    let elapsed = started.elapsed().as_secs_f64();
                    let tokens_per_second = reply
                        .completion_tokens
                        .filter(|_| elapsed > 0.0)
                        .map(|t| t as f64 / elapsed);
                    info!(attempt, elapsed_secs = elapsed, "model call succeeded");
                    return Ok(Completion {
                        document: extract_document(&reply.content),
                        tokens_per_second,
                    });
                }
                Err(e) if attempt < max_attempts && e.is_retryable() => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(attempt, max_attempts, ?delay, error = %e, "model call failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(ModelCallError::Exhausted {
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
            }
        }
    }
}
