//! Consumer of "item stored" events.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::application::services::IngestService;
use crate::domain::item_event::ItemStoredEvent;
use crate::infrastructure::events::EventHandler;

/// Re-runs store-and-aggregate for every announced item.
///
/// Items the synchronous pipeline already stored are no-ops thanks to the
/// idempotent upsert; items announced by another producer are stored and
/// counted once. Nothing is republished.
pub struct BackgroundProcessor {
    ingest: Arc<IngestService>,
}

impl BackgroundProcessor {
    pub fn new(ingest: Arc<IngestService>) -> Self {
        Self { ingest }
    }
}

#[async_trait]
impl EventHandler<ItemStoredEvent> for BackgroundProcessor {
    async fn handle(&self, event: ItemStoredEvent) {
        let item_id = event.item_id;

        let item = match event.to_new_item() {
            Ok(item) => item,
            Err(e) => {
                warn!(item_id, "Ignoring invalid item event: {}", e);
                metrics::counter!("events_dropped_total").increment(1);
                return;
            }
        };

        match self.ingest.store_and_aggregate(item).await {
            Ok(outcome) if outcome.created => {
                info!(
                    item_id,
                    keywords = outcome.keywords.len(),
                    "Stored item announced by event"
                );
            }
            Ok(_) => debug!(item_id, "Announced item already stored"),
            Err(e) => error!(item_id, "Failed to process item event: {}", e),
        }
    }
}
