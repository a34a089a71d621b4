//! Handlers for asynchronous jobs.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::api::dto::jobs::{SubmitJobRequest, SubmitJobResponse};
use crate::application::jobs::JobStatus;
use crate::error::AppError;
use crate::state::AppState;

/// Submits a job and returns immediately.
///
/// # Endpoint
///
/// `POST /api/jobs`
///
/// # Request Body
///
/// ```json
/// { "kind": "fetch_top_items", "limit": 30 }
/// ```
///
/// or `{ "kind": "refresh_summary" }`.
///
/// # Response
///
/// `202 Accepted` with `{ "job_id": "...", "state": "PENDING" }`.
///
/// # Errors
///
/// - 400 if `limit` is outside 1..=500
/// - 503 if the job queue is full
pub async fn submit_job_handler(
    State(state): State<AppState>,
    Json(payload): Json<SubmitJobRequest>,
) -> Result<(StatusCode, Json<SubmitJobResponse>), AppError> {
    payload.validate()?;

    let status = state.job_runner.submit(payload.into_spec())?;
    Ok((StatusCode::ACCEPTED, Json(status.into())))
}

/// Returns the current status of a job.
///
/// # Endpoint
///
/// `GET /api/jobs/{id}`
///
/// # Errors
///
/// Returns 404 for an unknown or pruned job id.
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatus>, AppError> {
    state
        .job_runner
        .status(job_id)
        .map(Json)
        .ok_or_else(|| AppError::not_found("Job not found", json!({ "job_id": job_id })))
}
