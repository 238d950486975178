//! Chat-completion client used by the refinement loop.
//!
//! `backend` performs exactly one HTTP exchange; `client` layers the retry
//! policy and per-call timeout on top; `extract` pulls the HTML document out
//! of whatever the model returned.

pub mod backend;
pub mod client;
pub mod extract;

pub use backend::{ChatBackend, ChatMessage, ChatReply, HttpChatBackend, Role};
pub use client::{Completion, ModelClient, RetryPolicy};
pub use extract::extract_document;
