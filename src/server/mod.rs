//! HTTP surface: job submission, job polling and the manifest view.
//!
//! | Method | Path                     | Result                          |
//! |--------|--------------------------|---------------------------------|
//! | POST   | `/api/generate`          | `202 {jobId}`                   |
//! | GET    | `/api/jobs/{id}?since=k` | job snapshot or `404`           |
//! | GET    | `/api/manifest`          | `fullName → ManifestEntry` map  |
//! | GET    | `/health`                | `ok`                            |

pub mod api;
#[allow(clippy::module_inception)]
pub mod server;

pub use api::{ApiError, AppState, SharedState};
pub use server::{ServerConfig, build_router, build_state, start_server};
