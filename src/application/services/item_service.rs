//! Item lookup and listing service.

use std::sync::Arc;

use crate::domain::entities::{Item, ItemFilter};
use crate::domain::repositories::{ItemRepository, StorageError};

/// One page of items plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub total: i64,
}

/// Read-only access to stored items.
pub struct ItemService {
    repository: Arc<dyn ItemRepository>,
}

impl ItemService {
    /// Creates a new item service.
    pub fn new(repository: Arc<dyn ItemRepository>) -> Self {
        Self { repository }
    }

    /// Looks up an item by its external id.
    ///
    /// An unknown id is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    pub async fn get(&self, id: i64) -> Result<Option<Item>, StorageError> {
        self.repository.find_by_id(id).await
    }

    /// Lists items matching `filter`, highest score first, with the total
    /// number of matches.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on database errors.
    pub async fn list(&self, filter: ItemFilter) -> Result<ItemPage, StorageError> {
        let total = self.repository.count(filter.clone()).await?;
        let items = self.repository.list(filter).await?;

        Ok(ItemPage { items, total })
    }
}
