//! Showcase generation: prompts, the refinement loop, and the batch orchestrator.

pub mod orchestrator;
pub mod progress;
pub mod prompts;
pub mod refine;

pub use orchestrator::{
    BatchReport, GenerateOptions, Generator, PushStatus, RepositoryFailure, is_external,
};
pub use progress::{LogKind, ProgressSink};
pub use refine::{RefinementLoop, RefinementRequest};
