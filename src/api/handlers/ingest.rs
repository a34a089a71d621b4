//! Handlers that run the ingestion pipeline synchronously.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::ingest::IngestQuery;
use crate::api::dto::items::IngestItemResponse;
use crate::application::services::BatchResult;
use crate::error::AppError;
use crate::state::AppState;

/// Runs one ingestion batch and waits for it.
///
/// # Endpoint
///
/// `POST /api/ingest?limit=50`
///
/// # Response
///
/// ```json
/// { "processed_count": 12, "new_count": 13, "total_fetched": 50 }
/// ```
///
/// Prefer `POST /api/jobs` for large batches.
///
/// # Errors
///
/// - 400 if `limit` is outside 1..=500
/// - 502 if the feed listing fails
pub async fn ingest_batch_handler(
    State(state): State<AppState>,
    Query(query): Query<IngestQuery>,
) -> Result<Json<BatchResult>, AppError> {
    query.validate()?;

    let result = state.ingest_service.ingest_batch(query.limit).await?;
    Ok(Json(result))
}

/// Fetches and ingests one known id.
///
/// # Endpoint
///
/// `POST /api/items/{id}/ingest`
///
/// # Errors
///
/// - 400 if the id is not positive or the item is not a live story
/// - 404 if the feed has no such item
/// - 502 if the feed call fails
pub async fn ingest_item_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<IngestItemResponse>, AppError> {
    if id <= 0 {
        return Err(AppError::bad_request(
            "Item id must be a positive integer",
            json!({ "id": id }),
        ));
    }

    let outcome = state.ingest_service.ingest_by_id(id).await?;
    Ok(Json(IngestItemResponse::new(id, outcome)))
}
