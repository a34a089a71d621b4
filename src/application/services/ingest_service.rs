//! Ingestion pipeline: fetch, dedupe, persist, extract, aggregate, publish.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::domain::entities::NewItem;
use crate::domain::extraction::{Vocabulary, extract_domain, extract_keywords, is_known_domain};
use crate::domain::feed::{FeedItem, FeedSource, FetchError, ValidationError};
use crate::domain::item_event::ItemStoredEvent;
use crate::domain::repositories::{ItemRepository, StorageError};
use crate::infrastructure::events::EventChannel;

/// Result of pushing one item through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    /// Whether a new row was written.
    pub created: bool,
    /// Keywords counted for this item; empty for duplicates.
    pub keywords: BTreeSet<String>,
    /// Extracted domain (possibly `"unknown"`); `None` for duplicates.
    pub domain: Option<String>,
}

impl IngestOutcome {
    fn duplicate() -> Self {
        Self {
            created: false,
            keywords: BTreeSet::new(),
            domain: None,
        }
    }
}

/// Totals for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct BatchResult {
    /// Items for which a new row was created.
    pub processed_count: usize,
    /// Candidate ids that were not stored before the batch started.
    pub new_count: usize,
    /// Ids returned by the feed listing.
    pub total_fetched: usize,
}

/// Progress snapshot reported after every handled candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub handled: usize,
    pub total: usize,
}

impl BatchProgress {
    /// `floor(handled * 100 / total)`, or 100 for an empty batch.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let percent = self.handled.min(self.total) * 100 / self.total;
        percent as u8
    }
}

/// Failure of a pipeline operation.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("storage failed for {failed} of {attempted} items in the batch")]
    StorageMajority { failed: usize, attempted: usize },
}

/// Tunables for the pipeline, taken from configuration.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Topic that "item stored" events are published on.
    pub topic: String,
    /// Upper bound on simultaneous detail fetches.
    pub fetch_concurrency: usize,
    /// Batch size when the caller gives none.
    pub default_limit: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            topic: "new_story".to_string(),
            fetch_concurrency: 8,
            default_limit: 50,
        }
    }
}

/// Orchestrates ingestion of single items and bounded batches.
///
/// Detail fetches within a batch run concurrently, bounded by
/// `fetch_concurrency`. Persistence for the items of one batch is strictly
/// sequential; across batches the repositories' per-key atomic upserts are
/// the only concurrency guard.
pub struct IngestService {
    items: Arc<dyn ItemRepository>,
    feed: Arc<dyn FeedSource>,
    events: Arc<dyn EventChannel>,
    vocabulary: Arc<Vocabulary>,
    settings: IngestSettings,
}

impl IngestService {
    /// Creates a new ingestion service.
    pub fn new(
        items: Arc<dyn ItemRepository>,
        feed: Arc<dyn FeedSource>,
        events: Arc<dyn EventChannel>,
        vocabulary: Arc<Vocabulary>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            items,
            feed,
            events,
            vocabulary,
            settings,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.settings.default_limit
    }

    /// Normalizes, stores and aggregates one raw feed item, then publishes an
    /// "item stored" event if the row is new.
    ///
    /// A duplicate returns `created == false` with empty results and touches
    /// no counters.
    ///
    /// # Errors
    ///
    /// - [`IngestError::Validation`] if the raw item is not a live story or
    ///   lacks required fields (nothing is written)
    /// - [`IngestError::Storage`] if a write fails
    pub async fn ingest_one(&self, raw: FeedItem) -> Result<IngestOutcome, IngestError> {
        let item = raw.normalize().inspect_err(|e| {
            debug!("Rejected feed item: {}", e);
            metrics::counter!("items_rejected_total").increment(1);
        })?;

        let event = ItemStoredEvent::new(&item, Utc::now());
        let outcome = self.store_and_aggregate(item).await?;

        if outcome.created {
            self.publish(&event);
        }

        Ok(outcome)
    }

    /// Fetches one known id from the feed and ingests it.
    ///
    /// # Errors
    ///
    /// [`IngestError::Fetch`] when the feed call fails, otherwise as
    /// [`Self::ingest_one`].
    pub async fn ingest_by_id(&self, id: i64) -> Result<IngestOutcome, IngestError> {
        let raw = self.feed.fetch_item(id).await?;
        self.ingest_one(raw).await
    }

    /// Stores an already-normalized item and bumps its counters, without
    /// publishing.
    ///
    /// The row and its increments are written as one unit, so calling it for
    /// an item that is already stored is a no-op and a failed call leaves
    /// nothing behind to block a retry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the write fails; nothing is persisted.
    pub async fn store_and_aggregate(&self, item: NewItem) -> Result<IngestOutcome, StorageError> {
        let item_id = item.id;
        let keywords = extract_keywords(&item.title, &self.vocabulary);
        let domain = extract_domain(item.link.as_deref());
        let counted_domain = is_known_domain(&domain).then(|| domain.clone());

        let created = self
            .items
            .insert_with_counters(item, keywords.iter().cloned().collect(), counted_domain)
            .await?;

        if !created {
            debug!(item_id, "Item already stored");
            metrics::counter!("items_duplicate_total").increment(1);
            return Ok(IngestOutcome::duplicate());
        }

        metrics::counter!("items_ingested_total").increment(1);
        debug!(item_id, keywords = keywords.len(), domain, "Item ingested");

        Ok(IngestOutcome {
            created: true,
            keywords,
            domain: Some(domain),
        })
    }

    /// Runs one batch of up to `limit` candidate ids.
    ///
    /// # Errors
    ///
    /// See [`Self::ingest_batch_with_progress`].
    pub async fn ingest_batch(&self, limit: Option<usize>) -> Result<BatchResult, IngestError> {
        self.ingest_batch_with_progress(limit, |_| {}).await
    }

    /// Runs one batch, calling `on_progress` after every handled candidate.
    ///
    /// Ids already in the store are skipped without a detail fetch and count
    /// as handled immediately. Failed fetches, rejected items and per-item
    /// storage failures are logged and skipped.
    ///
    /// # Errors
    ///
    /// - [`IngestError::Fetch`] if the id listing cannot be retrieved
    /// - [`IngestError::Storage`] if the existence check fails
    /// - [`IngestError::StorageMajority`] if storage failed for more than
    ///   half of the items that reached it
    pub async fn ingest_batch_with_progress<F>(
        &self,
        limit: Option<usize>,
        on_progress: F,
    ) -> Result<BatchResult, IngestError>
    where
        F: Fn(BatchProgress) + Send + Sync,
    {
        let limit = limit.unwrap_or(self.settings.default_limit);
        let ids = self.feed.list_top_ids(limit).await?;
        let total = ids.len();

        let known: HashSet<i64> = self.items.existing_ids(&ids).await?.into_iter().collect();

        let mut seen = HashSet::new();
        let new_ids: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| !known.contains(id) && seen.insert(*id))
            .collect();

        let mut result = BatchResult {
            processed_count: 0,
            new_count: new_ids.len(),
            total_fetched: total,
        };

        info!(
            total,
            new = result.new_count,
            known = total - result.new_count,
            "Starting ingestion batch"
        );

        let mut handled = total - result.new_count;
        on_progress(BatchProgress { handled, total });

        let concurrency = self.settings.fetch_concurrency.max(1);
        let mut fetches = stream::iter(new_ids)
            .map(|id| async move { (id, self.feed.fetch_item(id).await) })
            .buffer_unordered(concurrency);

        let mut attempted = 0;
        let mut storage_failures = 0;

        // Each fetch is stored as soon as it lands so progress moves with it.
        while let Some((item_id, fetched)) = fetches.next().await {
            match fetched {
                Ok(raw) => match self.ingest_one(raw).await {
                    Ok(outcome) => {
                        attempted += 1;
                        if outcome.created {
                            result.processed_count += 1;
                        }
                    }
                    Err(IngestError::Storage(e)) => {
                        attempted += 1;
                        storage_failures += 1;
                        error!(item_id, "Failed to store item: {}", e);
                    }
                    Err(e) => debug!(item_id, "Skipping item: {}", e),
                },
                Err(e) => {
                    metrics::counter!("feed_fetch_failures_total").increment(1);
                    warn!(item_id, "Failed to fetch item: {}", e);
                }
            }

            // Ids listed more than once were fetched once; never report past the total.
            handled = (handled + 1).min(total);
            on_progress(BatchProgress { handled, total });
        }

        if storage_failures > 0 && storage_failures * 2 > attempted {
            return Err(IngestError::StorageMajority {
                failed: storage_failures,
                attempted,
            });
        }

        on_progress(BatchProgress {
            handled: total,
            total,
        });

        info!(
            processed = result.processed_count,
            new = result.new_count,
            total = result.total_fetched,
            "Ingestion batch finished"
        );

        Ok(result)
    }

    fn publish(&self, event: &ItemStoredEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => {
                self.events.publish(&self.settings.topic, payload);
                metrics::counter!("events_published_total").increment(1);
            }
            Err(e) => warn!(item_id = event.item_id, "Failed to encode item event: {}", e),
        }
    }
}
