//! Repository trait for ingested items.

use crate::domain::entities::{Item, ItemFilter, NewItem};
use crate::domain::repositories::StorageError;
use async_trait::async_trait;

/// Repository interface for the items table.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgItemRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Inserts the item if its id is not stored yet.
    ///
    /// Never overwrites an existing row.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if a new row was created
    /// - `Ok(false)` if the id already existed
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    async fn upsert_item(&self, item: NewItem) -> Result<bool, StorageError>;

    /// Inserts the item and applies its counter increments as one unit.
    ///
    /// Each keyword is counted once and `domain` (if any) once. Nothing is
    /// written when the id is already stored, and a failed increment rolls
    /// back the item row together with every increment before it, so the
    /// call can simply be retried.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` if the item and its counters were committed
    /// - `Ok(false)` if the id already existed
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors; nothing is persisted.
    async fn insert_with_counters(
        &self,
        item: NewItem,
        keywords: Vec<String>,
        domain: Option<String>,
    ) -> Result<bool, StorageError>;

    /// Finds an item by its external id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<Item>, StorageError>;

    /// Returns the subset of `ids` that are already stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    async fn existing_ids(&self, ids: &[i64]) -> Result<Vec<i64>, StorageError>;

    /// Lists items matching the filter, highest score first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    async fn list(&self, filter: ItemFilter) -> Result<Vec<Item>, StorageError>;

    /// Counts items matching the filter's keyword/domain criteria.
    ///
    /// Pagination fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    async fn count(&self, filter: ItemFilter) -> Result<i64, StorageError>;
}
