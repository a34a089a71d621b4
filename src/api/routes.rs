//! API route configuration.
//!
//! Routes are split by cost: queries only touch the database, commands
//! call the external feed or enqueue work and get a stricter rate limit.

use crate::api::handlers::{
    dashboard_handler, get_item_handler, ingest_batch_handler, ingest_item_handler,
    job_status_handler, list_items_handler, submit_job_handler, summary_handler,
    top_domains_handler, top_keywords_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Read-only routes.
///
/// # Endpoints
///
/// - `GET  /items`                - List stored items (paginated, filterable)
/// - `GET  /items/{id}`           - One stored item
/// - `GET  /analytics/keywords`   - Top keywords
/// - `GET  /analytics/domains`    - Top domains
/// - `GET  /analytics/summary`    - Row totals
/// - `GET  /dashboard`            - Top lists plus summary
/// - `GET  /jobs/{id}`            - Job status
pub fn query_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items_handler))
        .route("/items/{id}", get(get_item_handler))
        .route("/analytics/keywords", get(top_keywords_handler))
        .route("/analytics/domains", get(top_domains_handler))
        .route("/analytics/summary", get(summary_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/jobs/{id}", get(job_status_handler))
}

/// Routes that reach the feed or enqueue work.
///
/// # Endpoints
///
/// - `POST /ingest`               - Run one ingestion batch synchronously
/// - `POST /items/{id}/ingest`    - Fetch and ingest one known id
/// - `POST /jobs`                 - Submit a job
pub fn command_routes() -> Router<AppState> {
    Router::new()
        .route("/ingest", post(ingest_batch_handler))
        .route("/items/{id}/ingest", post(ingest_item_handler))
        .route("/jobs", post(submit_job_handler))
}
