//! Repository trait for keyword and domain counters.

use crate::domain::entities::{AnalyticsSummary, DomainCount, KeywordCount};
use crate::domain::repositories::StorageError;
use async_trait::async_trait;

/// Repository interface for the aggregate counter tables.
///
/// Every increment is an atomic read-modify-write on a single key, so
/// concurrent batches and the background processor need no extra locking.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAnalyticsRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Adds one to the keyword's counter and refreshes `last_seen_at`,
    /// creating the row with `count = 1` on first sight.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    async fn increment_keyword(&self, keyword: &str) -> Result<(), StorageError>;

    /// Adds one to the domain's counter, creating it with `count = 1`.
    ///
    /// Does nothing for the `"unknown"` placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    async fn increment_domain(&self, domain: &str) -> Result<(), StorageError>;

    /// Returns keywords ordered by count descending, then keyword ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    async fn top_keywords(&self, limit: i64) -> Result<Vec<KeywordCount>, StorageError>;

    /// Returns domains ordered by count descending, then domain ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    async fn top_domains(&self, limit: i64) -> Result<Vec<DomainCount>, StorageError>;

    /// Returns row totals for items, keywords and domains.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    async fn summary(&self) -> Result<AnalyticsSummary, StorageError>;

    /// Cheap connectivity probe used by the health endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot be reached.
    async fn ping(&self) -> Result<(), StorageError>;
}
