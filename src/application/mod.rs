//! Application layer orchestrating domain operations.
//!
//! Services consume repository, feed and event-channel traits and provide a
//! clean API for HTTP handlers, the job runner and the admin CLI.
//!
//! # Components
//!
//! - [`services::IngestService`] - Fetch, dedupe, persist, extract, aggregate, publish
//! - [`services::ItemService`] - Item lookup and listing
//! - [`services::AnalyticsService`] - Top keywords/domains, summary, dashboard
//! - [`jobs::JobRunner`] - Asynchronous batch execution with progress
//! - [`background_processor::BackgroundProcessor`] - "Item stored" event consumer

pub mod background_processor;
pub mod jobs;
pub mod services;
