//! In-memory job tracking for background generation batches.
//!
//! A client submits a batch, gets a job id back at once, and polls with a
//! `since` cursor until the job reaches `success` or `error`.

pub mod runner;
pub mod store;

pub use runner::JobRunner;
pub use store::{JobOutcome, JobSnapshot, JobStatus, JobStore, JobWriter, LogLine};
