//! Handlers for stored items.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::json;

use crate::api::dto::items::{ItemListResponse, ItemResponse};
use crate::api::dto::pagination::{ItemsQueryParams, PaginationMeta};
use crate::domain::entities::ItemFilter;
use crate::error::AppError;
use crate::state::AppState;

/// Lists stored items, highest score first.
///
/// # Endpoint
///
/// `GET /api/items`
///
/// # Query Parameters
///
/// - `page` (optional): Page number (default: 1)
/// - `page_size` (optional): Items per page (default: 20, max: 100)
/// - `keyword` (optional): Case-insensitive title substring
/// - `domain` (optional): Case-insensitive link substring
pub async fn list_items_handler(
    State(state): State<AppState>,
    Query(params): Query<ItemsQueryParams>,
) -> Result<Json<ItemListResponse>, AppError> {
    let (offset, limit) = params
        .pagination
        .validate_and_get_offset_limit()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let filter = ItemFilter::new(offset, limit)
        .with_keyword(params.keyword)
        .with_domain(params.domain);

    let page = state.item_service.list(filter).await?;

    Ok(Json(ItemListResponse {
        pagination: PaginationMeta::new(
            params.pagination.page(),
            params.pagination.page_size(),
            page.total,
        ),
        items: page.items.into_iter().map(ItemResponse::from).collect(),
    }))
}

/// Returns one stored item.
///
/// # Endpoint
///
/// `GET /api/items/{id}`
///
/// # Errors
///
/// Returns 404 if the item is not stored.
pub async fn get_item_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ItemResponse>, AppError> {
    state
        .item_service
        .get(id)
        .await?
        .map(|item| Json(item.into()))
        .ok_or_else(|| AppError::not_found("Item not found", json!({ "id": id })))
}
