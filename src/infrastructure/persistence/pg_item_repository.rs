//! PostgreSQL implementation of item repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool};
use std::sync::Arc;

use super::pg_analytics_repository::{bump_domain, bump_keyword};
use crate::domain::entities::{Item, ItemFilter, NewItem};
use crate::domain::extraction::is_known_domain;
use crate::domain::repositories::{ItemRepository, StorageError};

/// PostgreSQL repository for ingested items.
///
/// Inserts use `ON CONFLICT DO NOTHING` so a stored row is never
/// overwritten, whichever writer gets there second. Ingestion goes through
/// [`ItemRepository::insert_with_counters`], which wraps the insert and the
/// counter upserts in one transaction.
pub struct PgItemRepository {
    pool: Arc<PgPool>,
}

impl PgItemRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ItemRow {
    id: i64,
    title: String,
    link: Option<String>,
    published_at: DateTime<Utc>,
    score: i64,
    comment_count: i64,
    author: Option<String>,
    fetched_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(r: ItemRow) -> Self {
        Item::new(
            r.id,
            r.title,
            r.link,
            r.published_at,
            r.score,
            r.comment_count,
            r.author,
            r.fetched_at,
        )
    }
}

/// `ILIKE` pattern for a substring match, with wildcards in the input escaped.
fn contains_pattern(value: &str) -> String {
    let escaped = value
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

async fn insert_row<'e, E>(executor: E, item: &NewItem) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let inserted: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO items (id, title, link, published_at, score, comment_count, author)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(item.id)
    .bind(&item.title)
    .bind(&item.link)
    .bind(item.published_at)
    .bind(item.score)
    .bind(item.comment_count)
    .bind(&item.author)
    .fetch_optional(executor)
    .await?;

    Ok(inserted.is_some())
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn upsert_item(&self, item: NewItem) -> Result<bool, StorageError> {
        Ok(insert_row(self.pool.as_ref(), &item).await?)
    }

    async fn insert_with_counters(
        &self,
        item: NewItem,
        keywords: Vec<String>,
        domain: Option<String>,
    ) -> Result<bool, StorageError> {
        let mut tx = self.pool.begin().await?;

        // Dropping the transaction without commit rolls everything back.
        if !insert_row(&mut *tx, &item).await? {
            return Ok(false);
        }

        for keyword in &keywords {
            bump_keyword(&mut *tx, keyword).await?;
        }

        if let Some(domain) = domain.as_deref().filter(|d| is_known_domain(d)) {
            bump_domain(&mut *tx, domain).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Item>, StorageError> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, title, link, published_at, score, comment_count, author, fetched_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Item::from))
    }

    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, StorageError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM items WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(found)
    }

    async fn list(&self, filter: ItemFilter) -> Result<Vec<Item>, StorageError> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, title, link, published_at, score, comment_count, author, fetched_at
            FROM items
            WHERE ($1::text IS NULL OR title ILIKE $1)
              AND ($2::text IS NULL OR link ILIKE $2)
            ORDER BY score DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.keyword.as_deref().map(contains_pattern))
        .bind(filter.domain.as_deref().map(contains_pattern))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn count(&self, filter: ItemFilter) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM items
            WHERE ($1::text IS NULL OR title ILIKE $1)
              AND ($2::text IS NULL OR link ILIKE $2)
            "#,
        )
        .bind(filter.keyword.as_deref().map(contains_pattern))
        .bind(filter.domain.as_deref().map(contains_pattern))
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }
}
