pub mod analysis;
pub mod config;
pub mod errors;
pub mod generate;
pub mod git;
pub mod jobs;
pub mod logging;
pub mod manifest;
pub mod model;
pub mod models;
pub mod server;
pub mod templates;
pub mod util;
