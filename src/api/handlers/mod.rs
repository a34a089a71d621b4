//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod analytics;
pub mod health;
pub mod ingest;
pub mod items;
pub mod jobs;

pub use analytics::{dashboard_handler, summary_handler, top_domains_handler, top_keywords_handler};
pub use health::health_handler;
pub use ingest::{ingest_batch_handler, ingest_item_handler};
pub use items::{get_item_handler, list_items_handler};
pub use jobs::{job_status_handler, submit_job_handler};
