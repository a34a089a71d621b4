//! DTOs for item lookup, listing and single-item ingestion.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::dto::pagination::PaginationMeta;
use crate::application::services::IngestOutcome;
use crate::domain::entities::Item;

/// One stored item.
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: i64,
    pub title: String,
    pub link: Option<String>,
    pub published_at: DateTime<Utc>,
    pub score: i64,
    pub comment_count: i64,
    pub author: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            title: item.title,
            link: item.link,
            published_at: item.published_at,
            score: item.score,
            comment_count: item.comment_count,
            author: item.author,
            fetched_at: item.fetched_at,
        }
    }
}

/// Paginated list of items.
#[derive(Debug, Serialize)]
pub struct ItemListResponse {
    pub pagination: PaginationMeta,
    pub items: Vec<ItemResponse>,
}

/// Result of `POST /api/items/{id}/ingest`.
#[derive(Debug, Serialize)]
pub struct IngestItemResponse {
    pub item_id: i64,
    pub created: bool,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl IngestItemResponse {
    pub fn new(item_id: i64, outcome: IngestOutcome) -> Self {
        Self {
            item_id,
            created: outcome.created,
            keywords: outcome.keywords.into_iter().collect(),
            domain: outcome.domain,
        }
    }
}
