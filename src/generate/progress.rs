use serde::{Deserialize, Serialize};

/// Stream a progress line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Stdout,
    Stderr,
    /// Terminal summary of a batch that produced at least one page.
    Success,
    Error,
}

/// Receiver for the orchestrator's human-readable progress lines.
///
/// Lines must be recorded in call order.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, kind: LogKind, message: &str);

    fn info(&self, message: &str) {
        self.emit(LogKind::Stdout, message);
    }

    fn warn(&self, message: &str) {
        self.emit(LogKind::Stderr, message);
    }

    fn success(&self, message: &str) {
        self.emit(LogKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.emit(LogKind::Error, message);
    }
}
