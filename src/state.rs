//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::application::jobs::{JobContext, JobRunner, JobRunnerSettings};
use crate::application::services::{AnalyticsService, IngestService, IngestSettings, ItemService};
use crate::domain::extraction::Vocabulary;
use crate::domain::feed::FeedSource;
use crate::domain::repositories::{AnalyticsRepository, ItemRepository};
use crate::infrastructure::events::EventChannel;

/// Services and long-lived components, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub ingest_service: Arc<IngestService>,
    pub item_service: Arc<ItemService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub job_runner: Arc<JobRunner>,
    pub events: Arc<dyn EventChannel>,
}

impl AppState {
    /// Wires services over the given collaborators and starts the job runner.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(
        items: Arc<dyn ItemRepository>,
        analytics: Arc<dyn AnalyticsRepository>,
        feed: Arc<dyn FeedSource>,
        events: Arc<dyn EventChannel>,
        vocabulary: Arc<Vocabulary>,
        ingest_settings: IngestSettings,
        job_settings: JobRunnerSettings,
    ) -> Self {
        let ingest_service = Arc::new(IngestService::new(
            items.clone(),
            feed,
            events.clone(),
            vocabulary,
            ingest_settings,
        ));
        let item_service = Arc::new(ItemService::new(items.clone()));
        let analytics_service = Arc::new(AnalyticsService::new(analytics, items));

        let job_runner = JobRunner::start(
            JobContext {
                ingest: ingest_service.clone(),
                analytics: analytics_service.clone(),
            },
            job_settings,
        );

        Self {
            ingest_service,
            item_service,
            analytics_service,
            job_runner,
            events,
        }
    }
}
