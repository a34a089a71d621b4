//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` round trip
/// 2. **Job Queue**: Runner accepting jobs, free slots
/// 3. **Event Channel**: Backend reachable
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;
    let queue_check = check_job_queue(&state);
    let events_check = check_event_channel(&state).await;

    let all_healthy = db_check.is_ok() && queue_check.is_ok() && events_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            job_queue: queue_check,
            event_channel: events_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    if state.analytics_service.is_store_healthy().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error("Database unreachable")
    }
}

fn check_job_queue(state: &AppState) -> CheckStatus {
    if state.job_runner.is_running() {
        CheckStatus::ok(format!("Free slots: {}", state.job_runner.queue_capacity()))
    } else {
        CheckStatus::error("Job runner is stopped")
    }
}

async fn check_event_channel(state: &AppState) -> CheckStatus {
    let backend = state.events.backend();
    if state.events.health_check().await {
        CheckStatus::ok(format!("{backend} channel connected"))
    } else {
        CheckStatus::error(format!("{backend} channel unavailable"))
    }
}
