//! Typed error hierarchy for the showcase generator.
//!
//! Three top-level enums cover the three failure domains:
//! - `ReferenceError`: malformed `owner/name` tokens
//! - `ModelCallError`: chat-completion endpoint failures
//! - `GenerateError`: orchestrator and batch-level failures

use std::time::Duration;

use thiserror::Error;

/// A repository token that is not exactly two non-empty `/`-separated halves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid repository reference '{token}': expected owner/name")]
pub struct ReferenceError {
    pub token: String,
}

/// Errors from a call to the model endpoint.
#[derive(Debug, Error)]
pub enum ModelCallError {
    #[error("Model endpoint returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Model endpoint returned an empty completion")]
    EmptyContent,

    #[error("Model request failed: {0}")]
    Transport(String),

    #[error("Model request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model call failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<ModelCallError>,
    },
}

impl ModelCallError {
    /// Every single-attempt failure is retried; only `Exhausted` is final.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ModelCallError::Exhausted { .. })
    }
}

/// Errors from the generation orchestrator.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    InvalidReference(#[from] ReferenceError),

    #[error("No repositories requested")]
    NoRepositories,

    #[error("Too many repositories requested: {count} (max {max})")]
    TooManyRepositories { count: usize, max: usize },

    #[error("Failed to clone {full_name}: {message}")]
    CloneFailed { full_name: String, message: String },

    #[error(transparent)]
    ModelCall(#[from] ModelCallError),

    #[error("Failed to persist {path}: {source}")]
    Persistence {
        path: std::path::PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Push failed: {0}")]
    Push(String),

    #[error("No repository was generated successfully")]
    NothingGenerated,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_error_carries_token() {
        let err = ReferenceError {
            token: "foo/bar/baz".to_string(),
        };
        assert!(err.to_string().contains("foo/bar/baz"));
    }

    #[test]
    fn exhausted_error_keeps_last_attempt_message() {
        let err = ModelCallError::Exhausted {
            attempts: 3,
            source: Box::new(ModelCallError::Http {
                status: 503,
                body: "overloaded".into(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("HTTP 503"));
        assert!(msg.contains("overloaded"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn single_attempt_errors_are_retryable() {
        assert!(ModelCallError::EmptyContent.is_retryable());
        assert!(ModelCallError::Timeout(Duration::from_secs(120)).is_retryable());
        assert!(ModelCallError::Transport("reset".into()).is_retryable());
    }

    #[test]
    fn generate_error_converts_from_model_error() {
        let err: GenerateError = ModelCallError::EmptyContent.into();
        assert!(matches!(err, GenerateError::ModelCall(ModelCallError::EmptyContent)));
    }

    #[test]
    fn too_many_repositories_reports_bound() {
        let err = GenerateError::TooManyRepositories { count: 6, max: 5 };
        assert!(err.to_string().contains("6"));
        assert!(err.to_string().contains("max 5"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&ReferenceError { token: "x".into() });
        assert_std_error(&ModelCallError::EmptyContent);
        assert_std_error(&GenerateError::NothingGenerated);
    }
}
