//! PostgreSQL implementation of the keyword/domain counter repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool};
use std::sync::Arc;

use crate::domain::entities::{AnalyticsSummary, DomainCount, KeywordCount};
use crate::domain::extraction::is_known_domain;
use crate::domain::repositories::{AnalyticsRepository, StorageError};

/// PostgreSQL repository for aggregate counters.
///
/// Increments are single `INSERT ... ON CONFLICT DO UPDATE` statements, so
/// concurrent writers never lose an update.
pub struct PgAnalyticsRepository {
    pool: Arc<PgPool>,
}

impl PgAnalyticsRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct KeywordRow {
    keyword: String,
    count: i64,
    last_seen_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct DomainRow {
    domain: String,
    count: i64,
}

#[derive(FromRow)]
struct SummaryRow {
    total_items: i64,
    total_keywords: i64,
    total_domains: i64,
}

/// Adds one to a keyword counter on any executor, pool or open transaction.
pub(super) async fn bump_keyword<'e, E>(executor: E, keyword: &str) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO keyword_counts (keyword, count, last_seen_at)
        VALUES ($1, 1, NOW())
        ON CONFLICT (keyword)
        DO UPDATE SET count = keyword_counts.count + 1, last_seen_at = NOW()
        "#,
    )
    .bind(keyword)
    .execute(executor)
    .await?;

    Ok(())
}

/// Adds one to a domain counter. Callers filter out `"unknown"` first.
pub(super) async fn bump_domain<'e, E>(executor: E, domain: &str) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO domain_counts (domain, count)
        VALUES ($1, 1)
        ON CONFLICT (domain)
        DO UPDATE SET count = domain_counts.count + 1
        "#,
    )
    .bind(domain)
    .execute(executor)
    .await?;

    Ok(())
}

#[async_trait]
impl AnalyticsRepository for PgAnalyticsRepository {
    async fn increment_keyword(&self, keyword: &str) -> Result<(), StorageError> {
        bump_keyword(self.pool.as_ref(), keyword).await?;
        Ok(())
    }

    async fn increment_domain(&self, domain: &str) -> Result<(), StorageError> {
        if !is_known_domain(domain) {
            return Ok(());
        }

        bump_domain(self.pool.as_ref(), domain).await?;
        Ok(())
    }

    async fn top_keywords(&self, limit: i64) -> Result<Vec<KeywordCount>, StorageError> {
        let rows = sqlx::query_as::<_, KeywordRow>(
            r#"
            SELECT keyword, count, last_seen_at
            FROM keyword_counts
            ORDER BY count DESC, keyword ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| KeywordCount {
                keyword: r.keyword,
                count: r.count,
                last_seen_at: r.last_seen_at,
            })
            .collect())
    }

    async fn top_domains(&self, limit: i64) -> Result<Vec<DomainCount>, StorageError> {
        let rows = sqlx::query_as::<_, DomainRow>(
            r#"
            SELECT domain, count
            FROM domain_counts
            ORDER BY count DESC, domain ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DomainCount {
                domain: r.domain,
                count: r.count,
            })
            .collect())
    }

    async fn summary(&self) -> Result<AnalyticsSummary, StorageError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM items) AS total_items,
                (SELECT COUNT(*) FROM keyword_counts) AS total_keywords,
                (SELECT COUNT(*) FROM domain_counts) AS total_domains
            "#,
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(AnalyticsSummary {
            total_items: row.total_items,
            total_keywords: row.total_keywords,
            total_domains: row.total_domains,
        })
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
