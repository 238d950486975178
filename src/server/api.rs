use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::config::GenerationSettings;
use crate::errors::GenerateError;
use crate::generate::GenerateOptions;
use crate::jobs::JobRunner;
use crate::manifest::ManifestStore;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub runner: JobRunner,
    pub manifest: ManifestStore,
    pub generation: GenerationSettings,
    pub api_key: Option<String>,
}

pub type SharedState = Arc<AppState>;

// ── Request / response payloads ───────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub repos: Vec<String>,
    pub iterations: Option<u32>,
    pub skip_refresh: Option<bool>,
    pub skip_push: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAccepted {
    pub job_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PollQuery {
    pub since: Option<usize>,
}

// ── Error type ────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                error!(error = %msg, "internal API error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::NoRepositories
            | GenerateError::TooManyRepositories { .. }
            | GenerateError::InvalidReference(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/generate", post(generate))
        .route("/api/jobs/{id}", get(get_job))
        .route("/api/manifest", get(get_manifest))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn generate(
    State(state): State<SharedState>,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateAccepted>), ApiError> {
    if req.iterations == Some(0) {
        return Err(ApiError::BadRequest(
            "iterations must be at least 1".to_string(),
        ));
    }
    let Some(api_key) = state.api_key.clone() else {
        return Err(ApiError::Internal(
            "Model API key is not configured on the server".to_string(),
        ));
    };

    let options = GenerateOptions {
        iterations: req.iterations.unwrap_or(state.generation.iterations),
        skip_refresh: req.skip_refresh.unwrap_or(state.generation.skip_refresh),
        skip_push: req.skip_push.unwrap_or(state.generation.skip_push),
        api_key,
    };
    let job_id = state.runner.submit(req.repos, options)?;
    Ok((StatusCode::ACCEPTED, Json(GenerateAccepted { job_id })))
}

async fn get_job(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<PollQuery>,
) -> Result<Json<crate::jobs::JobSnapshot>, ApiError> {
    state
        .runner
        .store()
        .poll(&id, query.since.unwrap_or(0))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job {} not found", id)))
}

async fn get_manifest(
    State(state): State<SharedState>,
) -> Result<Json<std::collections::BTreeMap<String, crate::models::ManifestEntry>>, ApiError> {
    let store = state.manifest.clone();
    let entries = tokio::task::spawn_blocking(move || store.load_map())
        .await
        .map_err(|e| ApiError::Internal(format!("Manifest task failed: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("{:#}", e)))?;
    Ok(Json(entries))
}
