//! Business logic services for the application layer.

pub mod analytics_service;
pub mod ingest_service;
pub mod item_service;

pub use analytics_service::{AnalyticsService, DASHBOARD_TOP_N, Dashboard, SummaryReport};
pub use ingest_service::{
    BatchProgress, BatchResult, IngestError, IngestOutcome, IngestService, IngestSettings,
};
pub use item_service::{ItemPage, ItemService};
